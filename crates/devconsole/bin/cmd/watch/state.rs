/// Which part of the watch screen receives navigation keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Focus {
    Log,
    Inspect,
}
