// File: proxiscan-core/src/checksums/algorithms.rs
//! Native check-digit validators.
//!
//! Each function takes a cleaned, digits-only candidate and returns whether it
//! passes. They are the local counterparts of the Painless fragments shipped in
//! `checksums/*.painless` and must reach the same decision for every input.
//!
//! License: MIT OR APACHE 2.0

/// Converts a digits-only string into its digit values.
///
/// Returns `None` as soon as a non-digit character is found.
fn digits_of(digits: &str) -> Option<Vec<u32>> {
    digits.chars().map(|c| c.to_digit(10)).collect()
}

fn weighted_sum(digits: &[u32], weights: &[u32]) -> u32 {
    digits.iter().zip(weights).map(|(d, w)| d * w).sum()
}

/// Validates a number using the Luhn algorithm.
///
/// The Luhn algorithm, also known as the Mod 10 algorithm, is a simple checksum
/// formula used to validate a variety of identification numbers, such as
/// credit card numbers.
///
/// # Arguments
///
/// * `digits` - A string slice containing only digits.
///
/// # Returns
///
/// `true` if the number is valid according to the Luhn algorithm, `false` otherwise.
pub fn is_valid_luhn(digits: &str) -> bool {
    if digits.is_empty() {
        return false;
    }
    let mut sum = 0;
    let mut alternate = false;

    for c in digits.chars().rev() {
        let Some(mut digit) = c.to_digit(10) else { return false; };

        if alternate {
            digit *= 2;
            if digit > 9 {
                digit -= 9;
            }
        }
        sum += digit;
        alternate = !alternate;
    }

    sum % 10 == 0
}

/// Validates an Australian Tax File Number.
///
/// Nine-digit TFNs use weights `1 4 3 7 5 8 6 9 10`; legacy eight-digit TFNs use
/// `10 7 8 4 6 3 5 1`. Either way the weighted sum must be divisible by 11.
pub fn is_valid_au_tfn(digits: &str) -> bool {
    const WEIGHTS_9: [u32; 9] = [1, 4, 3, 7, 5, 8, 6, 9, 10];
    const WEIGHTS_8: [u32; 8] = [10, 7, 8, 4, 6, 3, 5, 1];

    let Some(values) = digits_of(digits) else { return false; };
    let weights: &[u32] = match values.len() {
        9 => &WEIGHTS_9,
        8 => &WEIGHTS_8,
        _ => return false,
    };
    weighted_sum(&values, weights) % 11 == 0
}

/// Validates an Australian Business Number.
///
/// Subtract one from the leading digit, apply weights
/// `10 1 3 5 7 9 11 13 15 17 19` and require the sum to be divisible by 89.
pub fn is_valid_au_abn(digits: &str) -> bool {
    const WEIGHTS: [u32; 11] = [10, 1, 3, 5, 7, 9, 11, 13, 15, 17, 19];

    let Some(mut values) = digits_of(digits) else { return false; };
    if values.len() != 11 || values[0] == 0 {
        return false;
    }
    values[0] -= 1;
    weighted_sum(&values, &WEIGHTS) % 89 == 0
}

/// Validates an Australian Medicare card number (10 digits, optionally 11 with
/// the individual reference number).
///
/// The first digit must be 2-6 and the ninth digit is the check digit over the
/// first eight with weights `1 3 7 9 1 3 7 9`, modulo 10.
pub fn is_valid_au_medicare(digits: &str) -> bool {
    const WEIGHTS: [u32; 8] = [1, 3, 7, 9, 1, 3, 7, 9];

    let Some(values) = digits_of(digits) else { return false; };
    if !(values.len() == 10 || values.len() == 11) {
        return false;
    }
    if !(2..=6).contains(&values[0]) {
        return false;
    }
    weighted_sum(&values[..8], &WEIGHTS) % 10 == values[8]
}
