pub(crate) mod bottom_bar;
pub(crate) mod inspect;
pub(crate) mod log;
