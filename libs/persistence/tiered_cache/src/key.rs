use std::borrow::Cow;

/// A structured cache key with a deterministic string form.
///
/// Rendered keys are `PREFIX` followed by `_`-separated segments, so every
/// key of one type can be dropped by invalidating its prefix.
pub trait CacheKey {
    const PREFIX: &'static str;

    fn render(&self) -> Cow<'static, str>;
}

/// One component of a rendered key.
///
/// String segments percent-encode `%`, `_` and `*`, so a segment can never
/// forge a segment boundary and distinct values always render distinctly.
/// A bare `*` is reserved for an absent optional segment.
pub trait KeySegment {
    fn segment(&self) -> Cow<'_, str>;
}

const ABSENT: &str = "*";

impl KeySegment for String {
    fn segment(&self) -> Cow<'_, str> { self.as_str().segment() }
}

impl KeySegment for str {
    fn segment(&self) -> Cow<'_, str> {
        if !self.contains(['%', '_', '*']) {
            return Cow::Borrowed(self);
        }

        let mut escaped = String::with_capacity(self.len() + 6);
        for c in self.chars() {
            match c {
                '%' => escaped.push_str("%25"),
                '_' => escaped.push_str("%5F"),
                '*' => escaped.push_str("%2A"),
                c => escaped.push(c),
            }
        }
        Cow::Owned(escaped)
    }
}

impl<T: KeySegment> KeySegment for Option<T> {
    fn segment(&self) -> Cow<'_, str> {
        match self {
            Some(value) => value.segment(),
            None => Cow::Borrowed(ABSENT),
        }
    }
}

impl KeySegment for bool {
    fn segment(&self) -> Cow<'_, str> {
        Cow::Borrowed(if *self { "true" } else { "false" })
    }
}

macro_rules! display_segment {
    ($($t:ty),*) => {
        $(
            impl KeySegment for $t {
                fn segment(&self) -> Cow<'_, str> { Cow::Owned(self.to_string()) }
            }
        )*
    };
}

display_segment!(u32, u64, i32, i64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separators_in_segments_are_escaped() {
        assert_eq!("upper_intermediate".segment(), "upper%5Fintermediate");
        assert_eq!("upper-intermediate".segment(), "upper-intermediate");
        assert_eq!("100%_*".segment(), "100%25%5F%2A");
        assert_eq!("spanish".to_string().segment(), "spanish");
        assert_eq!(true.segment(), "true");
        assert_eq!(42u64.segment(), "42");
    }

    #[test]
    fn distinct_values_render_distinct_segments() {
        let segments = [
            Some("all".to_string()).segment().into_owned(),
            None::<String>.segment().into_owned(),
            Some("*".to_string()).segment().into_owned(),
            "a_b".segment().into_owned(),
            "a-b".segment().into_owned(),
            "a%5Fb".segment().into_owned(),
        ];

        for (i, left) in segments.iter().enumerate() {
            for right in &segments[i + 1..] {
                assert_ne!(left, right);
            }
        }
    }
}
