use std::fmt::{self, Display};

/// Writes `values` into `out` through `f`, putting `separator` before an item
/// whenever the previous one produced some output.
pub fn separated_by<T, F>(
    out: &mut String,
    values: impl IntoIterator<Item = T>,
    mut f: F,
    separator: &str,
) where
    F: FnMut(&mut String, T),
{
    let mut len = out.len();
    for v in values {
        if out.len() > len {
            out.push_str(separator);
        }
        len = out.len();
        f(out, v);
    }
}

/// Strips the named-parameter sigil (`@`, `:` or `$`) a caller may have kept on a name.
pub fn strip_parameter_sigil(name: &str) -> &str {
    name.strip_prefix(['@', ':', '$']).unwrap_or(name)
}

/// Displays at most 497 bytes of a query, followed by `...` when cut.
pub struct TruncateLong<'a>(pub &'a str);

impl Display for TruncateLong<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const MAX: usize = 497;
        let value = self.0;
        if value.len() <= MAX {
            return f.write_str(value.trim_end());
        }
        let mut end = MAX;
        while !value.is_char_boundary(end) {
            end -= 1;
        }
        write!(f, "{}...", value[..end].trim_end())
    }
}

#[macro_export]
macro_rules! truncate_long {
    ($query:expr) => {
        $crate::TruncateLong(::std::convert::AsRef::<str>::as_ref(&$query))
    };
}
