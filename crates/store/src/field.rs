use std::{borrow::Cow, fmt, marker::PhantomData};

/// A logical key of schema `S` whose values have type `V`.
///
/// A store for schema `S` only accepts `Field<S, _>`, so typos and
/// mismatched value types are compile errors:
///
/// ```
/// use llama_store::Field;
///
/// struct Profile;
///
/// impl Profile {
///     const NAME: Field<Profile, String> = Field::new("name");
///     const AGE: Field<Profile, u32> = Field::new("age");
/// }
/// # assert_eq!(Profile::AGE.name(), "age");
/// # assert_eq!(Profile::NAME.name(), "name");
/// ```
pub struct Field<S, V> {
    name: Cow<'static, str>,
    _marker: PhantomData<fn() -> (S, V)>,
}

impl<S, V> Field<S, V> {
    pub const fn new(name: &'static str) -> Self {
        Self { name: Cow::Borrowed(name), _marker: PhantomData }
    }

    /// Field whose name is only known at runtime.
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: Cow::Owned(name.into()), _marker: PhantomData }
    }

    pub fn name(&self) -> &str { &self.name }
}

impl<S, V> Clone for Field<S, V> {
    fn clone(&self) -> Self { Self { name: self.name.clone(), _marker: PhantomData } }
}

impl<S, V> fmt::Debug for Field<S, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Field").field(&self.name).finish()
    }
}

/// Schema for stores without a static key set.
#[derive(Debug, Clone, Copy, Default)]
pub struct Untyped;
