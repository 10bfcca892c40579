/// Declares a cache key struct.
///
/// ```ignore
/// cache_key!(LessonsCacheKey => "lessons"[topic_id: String, published_only: bool]);
/// // LessonsCacheKey { .. }.render() == "lessons_<topic_id>_<published_only>"
/// ```
///
/// Every field type must implement [`KeySegment`](crate::key::KeySegment).
#[macro_export]
macro_rules! cache_key {
    ($name:ident => $prefix:literal[$($field:ident: $ty:ty),+ $(,)?]) => {
        #[doc = concat!("Cache key\n ## Key \n", $prefix, $("_{", stringify!($field), "}",)+)]
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name {
            $(pub $field: $ty,)+
        }

        impl $crate::key::CacheKey for $name {
            const PREFIX: &'static str = $prefix;

            fn render(&self) -> std::borrow::Cow<'static, str> {
                let mut key = String::from($prefix);
                $(
                    key.push('_');
                    key.push_str(&$crate::key::KeySegment::segment(&self.$field));
                )+
                key.into()
            }
        }
    };
    ($name:ident => $prefix:literal) => {
        #[doc = concat!("Cache key\n ## Key \n", $prefix)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub struct $name;

        impl $crate::key::CacheKey for $name {
            const PREFIX: &'static str = $prefix;

            fn render(&self) -> std::borrow::Cow<'static, str> { ($prefix).into() }
        }
    };
}
