/// Formats a free/total pair, e.g. `14 free / 20 total`. An unknown total makes the whole value unknown.
pub fn human_capacity<T: std::fmt::Display>(free: Option<T>, total: Option<T>, unit: &str) -> String {
    match (free, total) {
        (Some(free), Some(total)) => format!("{free}{unit} free / {total}{unit} total"),
        _ => "unknown".to_string(),
    }
}

pub fn human_gb(gb: u64) -> String {
    format!("{gb} GB")
}
