pub fn pretty_bytes(n: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut val = n as f64;
    let mut idx = 0usize;
    while val >= 1024.0 && idx + 1 < UNITS.len() {
        val /= 1024.0;
        idx += 1;
    }
    if idx == 0 {
        format!("{n} {}", UNITS[idx])
    } else {
        format!("{:.1} {}", val, UNITS[idx])
    }
}

/// Hex dump in 16-byte rows, for `dump` without `--out`.
pub fn hex_rows(data: &[u8]) -> Vec<String> {
    data.chunks(16)
        .enumerate()
        .map(|(i, row)| {
            let hex: Vec<String> = row.iter().map(|b| format!("{b:02x}")).collect();
            format!("{:06x}  {}", i * 16, hex.join(" "))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes() {
        assert_eq!(pretty_bytes(512), "512 B");
        assert_eq!(pretty_bytes(40960), "40.0 KiB");
        assert_eq!(pretty_bytes(16 * 1024 * 1024), "16.0 MiB");
    }

    #[test]
    fn hex() {
        let rows = hex_rows(&[0xAB; 20]);
        assert_eq!(rows.len(), 2);
        assert!(rows[1].starts_with("000010  ab ab ab ab"));
    }
}
