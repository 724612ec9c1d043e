#[macro_export]
macro_rules! err_create {
    ($t:expr) => {
        $crate::error::TxInfoError::new($crate::error::ErrorBag::from($t), file!(), line!())
    };
}

#[macro_export]
macro_rules! err_custom_create {
    ($($t:tt)*) => {
        $crate::err_create!($crate::error::CustomError::new(&format!($($t)*)))
    };
}

#[macro_export]
macro_rules! err_from {
    () => {
        |e| $crate::err_create!(e)
    };
}
