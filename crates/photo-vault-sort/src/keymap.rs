use console::Key;

pub const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// What a keypress asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// File under the named month folder.
    File(&'static str),
    Skip,
    Quit,
    Unbound,
}

/// Number row as months: `1`-`9` January to September, `0` October,
/// `-` November, `=` December. Backspace skips, Esc quits.
pub fn action_for(key: &Key) -> Action {
    match key {
        Key::Char(c) => match month_index(*c) {
            Some(index) => Action::File(MONTHS[index]),
            None => Action::Unbound,
        },
        Key::Backspace => Action::Skip,
        Key::Escape => Action::Quit,
        _ => Action::Unbound,
    }
}

fn month_index(c: char) -> Option<usize> {
    match c {
        '1'..='9' => c.to_digit(10).map(|d| d as usize - 1),
        '0' => Some(9),
        '-' => Some(10),
        '=' => Some(11),
        _ => None,
    }
}

/// One-line legend shown above the first file.
pub fn legend() -> String {
    let keys = ['1', '2', '3', '4', '5', '6', '7', '8', '9', '0', '-', '='];
    let mut parts: Vec<String> = keys
        .iter()
        .zip(MONTHS)
        .map(|(key, month)| format!("{}={}", key, &month[..3]))
        .collect();
    parts.push("Backspace=skip".to_string());
    parts.push("Esc=quit".to_string());
    parts.join("  ")
}
