pub fn format_large_number(value: f64, decimals: usize) -> String {
    const UNITS: [(f64, &str); 4] = [(1e12, "T"), (1e9, "B"), (1e6, "M"), (1e3, "K")];

    for (threshold, suffix) in UNITS {
        if value >= threshold {
            return format!("{:.*}{suffix}", decimals, value / threshold);
        }
    }

    format!("{value:.decimals$}")
}

pub fn group_thousands(formatted: &str) -> String {
    let (sign, unsigned) = match formatted.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", formatted),
    };
    let (integer, fraction) = match unsigned.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (index, digit) in integer.chars().enumerate() {
        if index > 0 && (integer.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    match fraction {
        Some(fraction) => format!("{sign}{grouped}.{fraction}"),
        None => format!("{sign}{grouped}"),
    }
}

pub fn argb_to_hex(argb: i64) -> String {
    let argb = argb as u32;
    format!("#{:06x}", argb & 0x00ff_ffff)
}

pub fn truncate_label(name: &str, radius: f32) -> String {
    let max_chars = (radius / 4.0).floor().max(0.0) as usize;
    let char_count = name.chars().count();
    if char_count > max_chars && max_chars > 3 {
        let kept = name.chars().take(max_chars - 2).collect::<String>();
        format!("{kept}..")
    } else {
        name.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn large_numbers_get_magnitude_suffixes() {
        assert_eq!(format_large_number(1_500.0, 1), "1.5K");
        assert_eq!(format_large_number(2_000_000.0, 2), "2.00M");
        assert_eq!(format_large_number(3.2e9, 1), "3.2B");
        assert_eq!(format_large_number(1e12, 1), "1.0T");
        assert_eq!(format_large_number(999.0, 0), "999");
    }

    #[test]
    fn thousands_are_grouped_in_the_integer_part_only() {
        assert_eq!(group_thousands("1234567.891"), "1,234,567.891");
        assert_eq!(group_thousands("999"), "999");
        assert_eq!(group_thousands("-12345"), "-12,345");
    }

    #[test]
    fn argb_drops_the_alpha_channel() {
        assert_eq!(argb_to_hex(0xff11_2233), "#112233");
        assert_eq!(argb_to_hex(-16_777_216), "#000000");
        assert_eq!(argb_to_hex(-1), "#ffffff");
    }

    #[test]
    fn labels_truncate_with_radius() {
        assert_eq!(truncate_label("Switzerland", 24.0), "Swit..");
        assert_eq!(truncate_label("Peru", 24.0), "Peru");
        assert_eq!(truncate_label("Switzerland", 12.0), "Switzerland");
    }
}
