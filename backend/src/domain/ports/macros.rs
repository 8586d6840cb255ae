//! Helper macro for port error enums.
//!
//! Each variant gets a `thiserror` message and a snake_case constructor whose
//! parameters accept anything convertible into the field type, so adapters
//! can write `OrderRepositoryError::unavailable("pool closed")`.

macro_rules! define_port_error {
    (@ctor $variant:ident) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@ctor $variant:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        define_port_error!(@ctor_impl $variant () () $( $field : $ty, )*);
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) ) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]($($params)*) -> Self {
                Self::$variant { $($inits)* }
            }
        }
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) $field:ident : $ty:ty, $($rest:tt)*) => {
        define_port_error!(
            @ctor_impl
            $variant
            ($($params)* $field: impl Into<$ty>,)
            ($($inits)* $field: $field.into(),)
            $($rest)*
        );
    };
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@ctor $variant $( { $($field : $ty),* } )?);
            )*
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    define_port_error! {
        pub enum StockPortError {
            Offline => "stock service offline",
            Unavailable { message: String } => "unavailable: {message}",
            Short { item_id: u32, missing: i64 } => "item {item_id} short by {missing}",
        }
    }

    #[test]
    fn unit_variants_get_constructors() {
        assert_eq!(StockPortError::offline().to_string(), "stock service offline");
    }

    #[test]
    fn string_fields_accept_str() {
        let err = StockPortError::unavailable("pool closed");
        assert_eq!(err.to_string(), "unavailable: pool closed");
    }

    #[test]
    fn mixed_fields_keep_their_types() {
        let err = StockPortError::short(7_u32, 12_i64);
        assert_eq!(err, StockPortError::Short { item_id: 7, missing: 12 });
        assert_eq!(err.to_string(), "item 7 short by 12");
    }
}
