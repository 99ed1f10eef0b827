/// Returns early with `$err` when `$predicate` does not hold.
macro_rules! ensure {
    ($predicate:expr, $err:expr) => {
        if !$predicate {
            return Err($err.into());
        }
    };
}

/// Asserts that `$result` is an `Err` equal to `$expected`.
#[cfg(test)]
macro_rules! assert_err {
    ($result:expr, $expected:expr) => {
        match $result {
            Ok(_) => panic!("expected error {:?}, got Ok", $expected),
            Err(err) => assert_eq!(err, $expected),
        }
    };
}
