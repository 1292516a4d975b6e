//! Interactive population-size prompt.

use anyhow::{bail, Context};
use std::io::{BufRead, Write};

/// Ask for the number of patients until a usable answer is given.
///
/// Non-numbers, non-positive numbers and numbers below `minimum` are
/// rejected with a message and the question is asked again. End of input
/// aborts.
pub fn prompt_total<R: BufRead, W: Write>(
    mut input: R,
    mut output: W,
    minimum: u64,
) -> anyhow::Result<u64> {
    let mut line = String::new();
    loop {
        write!(output, "Enter the number of patients to generate: ")?;
        output.flush()?;

        line.clear();
        let read = input
            .read_line(&mut line)
            .context("Failed to read the number of patients")?;
        if read == 0 {
            bail!("No population size given");
        }

        let answer = line.trim();
        match answer.parse::<u64>() {
            Ok(0) => writeln!(output, "Please enter a positive number.")?,
            Ok(n) if n < minimum => writeln!(
                output,
                "Please enter at least {minimum} patients to ensure proper stratification."
            )?,
            Ok(n) => return Ok(n),
            Err(_) if is_negative_integer(answer) => {
                writeln!(output, "Please enter a positive number.")?
            }
            Err(_) => writeln!(output, "Please enter a valid number.")?,
        }
    }
}

fn is_negative_integer(answer: &str) -> bool {
    answer
        .strip_prefix('-')
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn run(input: &str, minimum: u64) -> (anyhow::Result<u64>, String) {
        let mut output = Vec::new();
        let result = prompt_total(Cursor::new(input), &mut output, minimum);
        (result, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_accepts_first_valid_answer() {
        let (result, output) = run("100\n", 32);
        assert_eq!(result.unwrap(), 100);
        assert_eq!(output, "Enter the number of patients to generate: ");
    }

    #[test]
    fn test_reprompts_until_valid() {
        let (result, output) = run("abc\n-5\n0\n31\n 32 \n", 32);

        assert_eq!(result.unwrap(), 32);
        assert_eq!(output.matches("Enter the number of patients").count(), 5);
        assert_eq!(output.matches("Please enter a valid number.").count(), 1);
        assert_eq!(output.matches("Please enter a positive number.").count(), 2);
        assert!(output.contains("Please enter at least 32 patients"));
    }

    #[test]
    fn test_accepts_full_unsigned_range() {
        let (result, output) = run("18446744073709551615\n", 32);
        assert_eq!(result.unwrap(), u64::MAX);
        assert!(!output.contains("Please enter"));
    }

    #[test]
    fn test_huge_negative_is_not_positive() {
        let (result, output) = run("-99999999999999999999\n40\n", 32);
        assert_eq!(result.unwrap(), 40);
        assert_eq!(output.matches("Please enter a positive number.").count(), 1);
    }

    #[test]
    fn test_end_of_input_aborts() {
        let (result, _) = run("nope\n", 32);
        assert!(result.is_err());
    }
}
