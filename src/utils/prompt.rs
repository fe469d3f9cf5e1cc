use std::io::{self, BufRead, Write};

/// Print `prompt` and read one trimmed line of input.
///
/// Returns `UnexpectedEof` when the input is closed so callers never spin on
/// an exhausted stdin.
pub fn prompt_line<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    prompt: &str,
) -> io::Result<String> {
    let mut line = String::new();

    write!(output, "{}", prompt)?;
    output.flush()?; // Make sure the prompt is immediately displayed

    if input.read_line(&mut line)? == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "input closed while waiting for a response",
        ));
    }

    Ok(line.trim().to_string())
}
