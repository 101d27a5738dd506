use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Identifier of one captured result slice: the complete result (`all`)
/// or a structured per-dimension offset/size window.
///
/// Keys are parsed from fixture file names once at load time and used as
/// plain hash keys afterwards; lookups never re-parse strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WindowKey {
    /// The complete, unwindowed result (`dataView_all`).
    All,
    /// A captured paging window of the result.
    Window(DataWindow),
}

/// One rectangular result window: `[row, column]` offsets plus `[row,
/// column]` sizes, where a `None` size means "from the offset to the end
/// of that dimension".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DataWindow {
    pub offset: [usize; 2],
    pub size: [Option<usize>; 2],
}

impl DataWindow {
    pub fn new(offset: [usize; 2], size: [Option<usize>; 2]) -> Self {
        Self { offset, size }
    }

    /// Convenience constructor for a window with both sizes bounded.
    pub fn bounded(offset: [usize; 2], size: [usize; 2]) -> Self {
        Self {
            offset,
            size: [Some(size[0]), Some(size[1])],
        }
    }
}

impl WindowKey {
    /// Parse a window spec string: `all` or `o<rowOff>_<colOff>s<rowSize>_<colSize>`
    /// where each size is a positive integer or `u` (unbounded).
    pub fn parse(spec: &str) -> Result<Self, String> {
        if spec == "all" {
            return Ok(Self::All);
        }

        let captures = window_spec_pattern()
            .captures(spec)
            .ok_or_else(|| format!("invalid window spec '{spec}'"))?;

        let offset = [parse_offset(&captures[1])?, parse_offset(&captures[2])?];
        let size = [parse_size(&captures[3])?, parse_size(&captures[4])?];

        Ok(Self::Window(DataWindow { offset, size }))
    }

    /// Parse a data-view file stem, e.g. `dataView_all` or `dataView_o0_0s10_1000`.
    pub fn from_file_stem(stem: &str) -> Result<Self, String> {
        let spec = stem
            .strip_prefix("dataView_")
            .ok_or_else(|| format!("data view file stem '{stem}' lacks 'dataView_' prefix"))?;
        Self::parse(spec)
    }

    /// Render the on-disk file stem for this key.
    pub fn file_stem(&self) -> String {
        format!("dataView_{self}")
    }
}

impl fmt::Display for WindowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Window(window) => write!(
                f,
                "o{}_{}s{}_{}",
                window.offset[0],
                window.offset[1],
                format_size(window.size[0]),
                format_size(window.size[1]),
            ),
        }
    }
}

fn format_size(size: Option<usize>) -> String {
    match size {
        Some(size) => size.to_string(),
        None => "u".to_owned(),
    }
}

fn window_spec_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^o(\d+)_(\d+)s(\d+|u)_(\d+|u)$").expect("window spec pattern is valid")
    })
}

fn parse_offset(text: &str) -> Result<usize, String> {
    text.parse::<usize>()
        .map_err(|_| format!("window offset '{text}' is not a valid integer"))
}

fn parse_size(text: &str) -> Result<Option<usize>, String> {
    if text == "u" {
        return Ok(None);
    }
    let size: usize = text
        .parse()
        .map_err(|_| format!("window size '{text}' is not a valid integer"))?;
    if size == 0 {
        return Err("window size must be positive".to_owned());
    }
    Ok(Some(size))
}

#[cfg(test)]
mod tests {
    use super::{DataWindow, WindowKey};

    #[test]
    fn parses_the_all_sentinel() {
        assert_eq!(WindowKey::parse("all").expect("parse all"), WindowKey::All);
    }

    #[test]
    fn parses_bounded_windows() {
        let key = WindowKey::parse("o5_0s10_1000").expect("parse bounded window");
        assert_eq!(
            key,
            WindowKey::Window(DataWindow::bounded([5, 0], [10, 1000]))
        );
    }

    #[test]
    fn parses_unbounded_sizes() {
        let key = WindowKey::parse("o0_2s100_u").expect("parse unbounded window");
        assert_eq!(
            key,
            WindowKey::Window(DataWindow::new([0, 2], [Some(100), None]))
        );
    }

    #[test]
    fn rejects_zero_sizes() {
        WindowKey::parse("o0_0s0_10").expect_err("zero row size must be rejected");
        WindowKey::parse("o0_0s10_0").expect_err("zero column size must be rejected");
    }

    #[test]
    fn rejects_malformed_specs() {
        for spec in ["", "o0_0", "s10_10", "o0_0s10", "oa_bs1_1", "All"] {
            WindowKey::parse(spec).expect_err("malformed spec must be rejected");
        }
    }

    #[test]
    fn file_stem_round_trips() {
        for stem in ["dataView_all", "dataView_o0_0s10_1000", "dataView_o3_1s5_u"] {
            let key = WindowKey::from_file_stem(stem).expect("parse file stem");
            assert_eq!(key.file_stem(), stem);
        }
    }

    #[test]
    fn from_file_stem_requires_prefix() {
        WindowKey::from_file_stem("o0_0s10_10").expect_err("missing prefix must be rejected");
    }
}
