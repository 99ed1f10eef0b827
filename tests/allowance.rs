use confidential_token::{testing, AccountKeys, Ciphertext, EntryPoint, Error, Event};
use rand::thread_rng;

#[test]
pub fn unset_allowance_reads_as_zero() {
    let mut rng = thread_rng();
    let (token, owner) = testing::deploy(&mut rng, 1_000, 2);
    let spender = AccountKeys::generate(&mut rng);

    let ct = token
        .allowance(&spender.public, &owner.public, &spender.public)
        .unwrap();
    assert_eq!(ct, Ciphertext::zero());
    assert_eq!(spender.decrypt(&ct), Ok(0));
}

#[test]
pub fn only_parties_read_the_allowance() {
    let mut rng = thread_rng();
    let (mut token, owner) = testing::deploy(&mut rng, 1_000, 2);
    let spender = AccountKeys::generate(&mut rng);
    let stranger = AccountKeys::generate(&mut rng);

    let input = testing::encrypt_input(&token, &owner, EntryPoint::Approve, 300, &mut rng);
    assert_eq!(token.approve(&owner.public, &spender.public, &input), Ok(true));

    assert_eq!(
        testing::allowance(&token, &owner, &owner.public, &spender.public),
        300
    );
    assert_eq!(
        testing::allowance(&token, &spender, &owner.public, &spender.public),
        300
    );
    assert_eq!(
        token.allowance(&stranger.public, &owner.public, &spender.public),
        Err(Error::AccessDenied {
            caller: stranger.public
        })
    );
}

#[test]
pub fn insufficient_allowance_or_balance_is_a_no_op() {
    let mut rng = thread_rng();
    let (mut token, owner) = testing::deploy(&mut rng, 100, 2);
    let spender = AccountKeys::generate(&mut rng);
    let receiver = AccountKeys::generate(&mut rng);

    token
        .approve_clear(&owner.public, &spender.public, 500)
        .unwrap();
    assert_eq!(
        token.events().last(),
        Some(&Event::ApprovalClear {
            owner: owner.public,
            spender: spender.public,
            amount: 500
        })
    );

    // Covered by the allowance, not by the balance.
    let input = testing::encrypt_input(&token, &spender, EntryPoint::TransferFrom, 200, &mut rng);
    let res = token.transfer_from(&spender.public, &owner.public, &receiver.public, &input, true);
    assert_eq!(res, Ok(false));
    assert_eq!(testing::balance(&token, &owner), 100);
    assert_eq!(testing::balance(&token, &receiver), 0);
    assert_eq!(
        testing::allowance(&token, &spender, &owner.public, &spender.public),
        500
    );

    // Reapproving overwrites the allowance.
    token
        .approve_clear(&owner.public, &spender.public, 20)
        .unwrap();
    let res =
        token.transfer_from_clear(&spender.public, &owner.public, &receiver.public, 20, true);
    assert_eq!(res, Ok(true));
    assert_eq!(testing::balance(&token, &owner), 80);
    assert_eq!(testing::balance(&token, &receiver), 20);
    assert_eq!(
        testing::allowance(&token, &owner, &owner.public, &spender.public),
        0
    );
}

#[test]
pub fn spender_cannot_use_the_owner_input() {
    let mut rng = thread_rng();
    let (mut token, owner) = testing::deploy(&mut rng, 100, 2);
    let spender = AccountKeys::generate(&mut rng);
    token
        .approve_clear(&owner.public, &spender.public, 50)
        .unwrap();

    let input = testing::encrypt_input(&token, &owner, EntryPoint::TransferFrom, 10, &mut rng);
    let res = token.transfer_from(&spender.public, &owner.public, &spender.public, &input, false);
    assert_eq!(res, Err(Error::SignatureVerificationFailed));
}
