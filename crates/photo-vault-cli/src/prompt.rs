use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

pub fn prompt_confirm(prompt: &str, default: Option<bool>) -> io::Result<bool> {
    confirm_from(&mut io::stdin().lock(), &mut io::stdout(), prompt, default)
}

/// Ask for a path, offering `default` when the answer is empty.
pub fn prompt_path(prompt: &str, default: Option<&Path>) -> io::Result<PathBuf> {
    path_from(&mut io::stdin().lock(), &mut io::stdout(), prompt, default)
}

fn confirm_from(
    input: &mut impl BufRead,
    output: &mut impl Write,
    prompt: &str,
    default: Option<bool>,
) -> io::Result<bool> {
    let mut line = String::new();

    loop {
        line.clear();

        match default {
            Some(true) => write!(output, "{} (Y/n): ", prompt)?,
            Some(false) | None => write!(output, "{} (y/N): ", prompt)?,
        }
        output.flush()?;

        if input.read_line(&mut line)? == 0 {
            return Err(eof());
        }

        match line.trim().to_uppercase().as_str() {
            "Y" | "YES" => return Ok(true),
            "N" | "NO" => return Ok(false),
            "" => match default {
                Some(default) => return Ok(default),
                None => continue,
            },
            _ => continue,
        }
    }
}

fn path_from(
    input: &mut impl BufRead,
    output: &mut impl Write,
    prompt: &str,
    default: Option<&Path>,
) -> io::Result<PathBuf> {
    let mut line = String::new();

    loop {
        line.clear();

        match default {
            Some(path) => write!(output, "{} [{}]: ", prompt, path.display())?,
            None => write!(output, "{}: ", prompt)?,
        }
        output.flush()?;

        if input.read_line(&mut line)? == 0 {
            return Err(eof());
        }

        match (line.trim(), default) {
            ("", Some(path)) => return Ok(path.to_path_buf()),
            ("", None) => continue,
            (answer, _) => return Ok(PathBuf::from(answer)),
        }
    }
}

fn eof() -> io::Error {
    io::Error::new(io::ErrorKind::UnexpectedEof, "input closed")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirm_uses_default_on_empty_line() {
        let mut out = Vec::new();
        assert!(confirm_from(&mut "\n".as_bytes(), &mut out, "Go?", Some(true)).unwrap());
        assert!(!confirm_from(&mut "\n".as_bytes(), &mut out, "Go?", Some(false)).unwrap());
    }

    #[test]
    fn test_confirm_reprompts_until_answered() {
        let mut out = Vec::new();
        assert!(confirm_from(&mut "maybe\n\ny\n".as_bytes(), &mut out, "Go?", None).unwrap());
        assert_eq!(String::from_utf8(out).unwrap().matches("Go?").count(), 3);
    }

    #[test]
    fn test_path_prompt() {
        let mut out = Vec::new();
        let fallback = Path::new("/backup");
        assert_eq!(
            path_from(&mut "\n".as_bytes(), &mut out, "Destination", Some(fallback)).unwrap(),
            PathBuf::from("/backup")
        );
        assert_eq!(
            path_from(&mut "  /media/sd  \n".as_bytes(), &mut out, "Source", None).unwrap(),
            PathBuf::from("/media/sd")
        );
    }

    #[test]
    fn test_closed_input_is_an_error() {
        let mut out = Vec::new();
        let err = path_from(&mut "".as_bytes(), &mut out, "Source", None).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
