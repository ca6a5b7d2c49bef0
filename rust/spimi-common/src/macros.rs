/// Unwraps a `Result` inside a function returning `Option<Result<T, E>>`.
///
/// `Ok(t)` yields `t`; `Err(e)` returns `Some(Err(e))` from the enclosing function.
/// Meant for `Iterator<Item = Result<T, E>>::next()` implementations, such as the block
/// record iterators, that call fallible helpers.
#[macro_export]
macro_rules! try_or_ret_some_err {
    ($expr:expr) => {
        match $expr {
            Ok(value) => value,
            Err(err) => {
                return Some(Err(err));
            }
        }
    };
}
