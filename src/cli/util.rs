use chrono::NaiveDate;
use rust_decimal::Decimal;

pub fn fmt_money(symbol: &str, d: &Decimal) -> String {
    crate::export::fmt_amount(symbol, *d)
}

pub fn parse_money(s: &str) -> Option<Decimal> {
    Decimal::from_str_exact(s.trim()).ok()
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y/%m/%d"))
        .ok()
}

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub fn iso(d: &NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

/// `from..to`, either side optional: "2024-07-01..", "..2024-07-31".
pub fn parse_range(s: &str) -> Result<(Option<NaiveDate>, Option<NaiveDate>), String> {
    let s = s.trim();
    if s.is_empty() {
        return Ok((None, None));
    }
    let (from, to) = s.split_once("..").unwrap_or((s, s));
    let side = |v: &str| -> Result<Option<NaiveDate>, String> {
        if v.trim().is_empty() {
            return Ok(None);
        }
        parse_date(v).map(Some).ok_or_else(|| format!("Bad date '{}', use YYYY-MM-DD", v.trim()))
    };
    let (from, to) = (side(from)?, side(to)?);
    if let (Some(f), Some(t)) = (from, to) {
        if f > t {
            return Err("Start date is after end date".into());
        }
    }
    Ok((from, to))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, day)
    }

    #[test]
    fn money_parsing_is_strict() {
        assert_eq!(parse_money(" 12.50 "), Some(Decimal::new(1250, 2)));
        assert_eq!(parse_money("12,50"), None);
        assert_eq!(parse_money(""), None);
    }

    #[test]
    fn dates_accept_dashes_and_slashes() {
        assert_eq!(parse_date("2024-07-01"), d(2024, 7, 1));
        assert_eq!(parse_date("2024/07/01"), d(2024, 7, 1));
        assert_eq!(parse_date("07/01/2024"), None);
    }

    #[test]
    fn ranges() {
        assert_eq!(parse_range(""), Ok((None, None)));
        assert_eq!(parse_range("2024-07-01.."), Ok((d(2024, 7, 1), None)));
        assert_eq!(parse_range("..2024-07-31"), Ok((None, d(2024, 7, 31))));
        assert_eq!(parse_range("2024-07-05"), Ok((d(2024, 7, 5), d(2024, 7, 5))));
        assert!(parse_range("2024-08-01..2024-07-01").is_err());
        assert!(parse_range("soon..").is_err());
    }
}
