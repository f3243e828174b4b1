use tracing::Level;

// ============================================================================
// Log Assertions
// ============================================================================

// Helpers for `logs_assert`, which passes the lines captured for the running test

/// Checks that exactly `expected` lines were logged at `level`
pub fn expect_level(lines: &[&str], level: Level, expected: usize) -> Result<(), String> {
    expect_matching(lines, level, "", expected)
}

/// Checks that exactly `expected` lines at `level` mention `text`
pub fn expect_matching(
    lines: &[&str],
    level: Level,
    text: &str,
    expected: usize,
) -> Result<(), String> {
    let marker = format!(" {} ", level);
    let found = lines
        .iter()
        .filter(|line| line.contains(&marker) && line.contains(text))
        .count();

    if found == expected {
        Ok(())
    } else {
        Err(format!(
            "expected {} {} lines containing {:?}, found {}",
            expected, level, text, found
        ))
    }
}
