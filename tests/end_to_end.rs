use confidential_token::{testing, AccountKeys, EntryPoint, Event};
use rand::thread_rng;

#[test]
pub fn clear_transfers_with_reveal() {
    let mut rng = thread_rng();
    let (mut token, owner) = testing::deploy(&mut rng, 500_000_000, 5);
    let receiver = AccountKeys::generate(&mut rng);

    assert_eq!(token.decimals(), 5);
    assert_eq!(token.total_supply(), 500_000_000);
    assert_eq!(testing::balance(&token, &owner), 500_000_000);

    let res = token.transfer_clear(&owner.public, &receiver.public, 5, true);
    assert_eq!(res, Ok(true));
    assert_eq!(testing::balance(&token, &owner), 499_999_995);
    assert_eq!(testing::balance(&token, &receiver), 5);

    let res = token.transfer_clear(&owner.public, &receiver.public, 5, true);
    assert_eq!(res, Ok(true));
    assert_eq!(testing::balance(&token, &owner), 499_999_990);
    assert_eq!(testing::balance(&token, &receiver), 10);

    assert_eq!(
        token.events().last(),
        Some(&Event::TransferClear {
            from: owner.public,
            to: receiver.public,
            amount: 5
        })
    );
}

#[test]
pub fn supply_is_conserved() {
    let mut rng = thread_rng();
    let supply = 1_000_000;
    let (mut token, owner) = testing::deploy(&mut rng, supply, 6);
    let accounts: Vec<_> = (0..4).map(|_| AccountKeys::generate(&mut rng)).collect();

    for (i, account) in accounts.iter().enumerate() {
        let amount = 1_000 * (i as u64 + 1);
        let input = testing::encrypt_input(&token, &owner, EntryPoint::Transfer, amount, &mut rng);
        assert_eq!(
            token.transfer(&owner.public, &account.public, &input, true),
            Ok(true)
        );
    }

    // Some succeed, some exceed the sender's balance.
    for (amount, sender, receiver) in [
        (500, &accounts[0], &accounts[1]),
        (5_000, &accounts[1], &accounts[2]),
        (4_000, &accounts[3], &accounts[0]),
        (1, &accounts[2], &accounts[2]),
    ] {
        let input = testing::encrypt_input(&token, sender, EntryPoint::Transfer, amount, &mut rng);
        token
            .transfer(&sender.public, &receiver.public, &input, false)
            .unwrap();
    }

    let total: u64 = accounts
        .iter()
        .chain(core::iter::once(&owner))
        .map(|keys| testing::balance(&token, keys))
        .sum();
    assert_eq!(total, supply);
    assert_eq!(testing::balance(&token, &accounts[0]), 4_500);
    assert_eq!(testing::balance(&token, &accounts[1]), 2_500);
    assert_eq!(testing::balance(&token, &accounts[3]), 0);
}

#[test]
pub fn encrypted_transfer_events_hide_the_amount() {
    let mut rng = thread_rng();
    let (mut token, owner) = testing::deploy(&mut rng, 100, 0);
    let receiver = AccountKeys::generate(&mut rng);
    token.take_events();

    let input = testing::encrypt_input(&token, &owner, EntryPoint::Transfer, 42, &mut rng);
    token
        .transfer(&owner.public, &receiver.public, &input, false)
        .unwrap();

    assert_eq!(
        token.take_events(),
        vec![Event::Transfer {
            from: owner.public,
            to: receiver.public
        }]
    );
}
