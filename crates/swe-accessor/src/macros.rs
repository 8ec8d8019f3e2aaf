//! Declarative generation of typed accessor structs.

/// Generate a typed accessor struct over a [`DataAccessor`](crate::DataAccessor).
///
/// Each entry names a method kind and the method to generate. The method
/// name is matched against the root component's children unless a
/// `#[path = "..."]` attribute gives the component path explicitly. Paths are
/// resolved when a method is first called.
///
/// | kind | generated signature |
/// |---|---|
/// | `get name: T` | `fn name(&mut self) -> AccessorResult<T>` |
/// | `set name: T` | `fn name(&mut self, value: T) -> AccessorResult<()>` |
/// | `count name` | `fn name(&mut self) -> AccessorResult<usize>` |
/// | `resize name` | `fn name(&mut self, size: usize) -> AccessorResult<()>` |
/// | `element name: V` | `fn name(&mut self, index: usize) -> AccessorResult<V>` |
/// | `add name: V` | `fn name(&mut self) -> AccessorResult<V>` |
/// | `select name` | `fn name(&mut self, item: &str) -> AccessorResult<()>` |
///
/// `V` is any [`AccessorView`](crate::AccessorView), usually another
/// generated struct describing one array element.
///
/// # Example
///
/// ```
/// use swe_accessor::data_accessor;
/// use swe_common::{DataComponent, ElementCount};
///
/// data_accessor! {
///     pub struct Sample {
///         get value: f64;
///     }
/// }
///
/// data_accessor! {
///     pub struct Series {
///         get count: i32;
///         #[path = "values"]
///         count num_values;
///         #[path = "values"]
///         add add_value: Sample;
///     }
/// }
///
/// let schema = DataComponent::record(
///     "series",
///     vec![
///         DataComponent::count("count"),
///         DataComponent::array(
///             "values",
///             DataComponent::quantity("value", "m"),
///             ElementCount::Sibling("count".into()),
///         ),
///     ],
/// );
///
/// let mut series = Series::new(&schema);
/// series.wrap(schema.create_data_block().unwrap());
/// series.add_value().unwrap();
/// assert_eq!(series.num_values().unwrap(), 1);
/// assert_eq!(series.count().unwrap(), 1);
/// ```
#[macro_export]
macro_rules! data_accessor {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[path = $path:literal])?
                $kind:ident $method:ident $(: $ty:ty)?;
            )*
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            inner: $crate::DataAccessor,
        }

        impl $name {
            pub fn new(component: &$crate::__swe_common::DataComponent) -> Self {
                <Self as $crate::AccessorView>::from_accessor($crate::DataAccessor::new(component))
            }

            /// Point the accessor at another data block.
            pub fn wrap(&mut self, block: $crate::__swe_common::DataBlock) {
                self.inner.wrap(block);
            }

            $(
                $crate::__accessor_method!($kind $method $(: $ty)?);
            )*
        }

        impl $crate::AccessorView for $name {
            #[allow(unused_mut)]
            fn from_accessor(mut inner: $crate::DataAccessor) -> Self {
                $(
                    $( inner.bind(stringify!($method), $path); )?
                )*
                Self { inner }
            }

            fn accessor(&self) -> &$crate::DataAccessor {
                &self.inner
            }

            fn accessor_mut(&mut self) -> &mut $crate::DataAccessor {
                &mut self.inner
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __accessor_method {
    (get $method:ident : $ty:ty) => {
        pub fn $method(&mut self) -> $crate::AccessorResult<$ty> {
            self.inner.get::<$ty>(stringify!($method))
        }
    };
    (set $method:ident : $ty:ty) => {
        pub fn $method(&mut self, value: $ty) -> $crate::AccessorResult<()> {
            self.inner.set::<$ty>(stringify!($method), value)
        }
    };
    (count $method:ident) => {
        pub fn $method(&mut self) -> $crate::AccessorResult<usize> {
            self.inner.count(stringify!($method))
        }
    };
    (resize $method:ident) => {
        pub fn $method(&mut self, size: usize) -> $crate::AccessorResult<()> {
            self.inner.set_num(stringify!($method), size)
        }
    };
    (element $method:ident : $ty:ty) => {
        pub fn $method(&mut self, index: usize) -> $crate::AccessorResult<$ty> {
            self.inner
                .element(stringify!($method), index)
                .map(<$ty as $crate::AccessorView>::from_accessor)
        }
    };
    (add $method:ident : $ty:ty) => {
        pub fn $method(&mut self) -> $crate::AccessorResult<$ty> {
            self.inner
                .add(stringify!($method))
                .map(<$ty as $crate::AccessorView>::from_accessor)
        }
    };
    (select $method:ident) => {
        pub fn $method(&mut self, item: &str) -> $crate::AccessorResult<()> {
            self.inner.select(stringify!($method), item)
        }
    };
}
