//! 고정 오프셋 레코드 파서.
//!
//! 스크랩한 행 텍스트를 시장별 문자 오프셋으로 잘라 `PriceRecord` 로 변환합니다.
//! 순수 함수이며 부수 효과가 없습니다.

use rust_decimal::Decimal;
use std::str::FromStr;

use crate::domain::PriceRecord;
use crate::error::MalformedRowError;
use crate::types::{FieldSpan, OffsetSchema, TRAILING_FIELD_WIDTH};

/// 행 하나를 파싱합니다.
///
/// 오프셋은 바이트가 아닌 문자 단위입니다.
///
/// # Errors
///
/// - `MalformedRowError::TooShort`: 행이 `schema.min_row_len()` 보다 짧음
/// - `MalformedRowError::InvalidNumber`: 가격 필드가 숫자가 아님
pub fn parse_record(raw: &str, schema: &OffsetSchema) -> Result<PriceRecord, MalformedRowError> {
    let chars: Vec<char> = raw.chars().collect();
    let len = chars.len();

    if len < schema.min_row_len() {
        return Err(MalformedRowError::TooShort {
            expected: schema.min_row_len(),
            actual: len,
        });
    }

    let slice = |span: FieldSpan| chars[span.start..span.end].iter().collect::<String>();
    let trailing_start = len - TRAILING_FIELD_WIDTH;

    Ok(PriceRecord {
        date: slice(schema.date),
        open: parse_price("open", &slice(schema.open))?,
        high: parse_price("high", &slice(schema.high))?,
        low: parse_price("low", &slice(schema.low))?,
        close: parse_price("close", &slice(schema.close))?,
        volume: chars[schema.fixed_width()..trailing_start].iter().collect(),
        percent_change: chars[trailing_start..].iter().collect(),
    })
}

/// 여러 행을 순서대로 파싱합니다. 첫 실패에서 중단하고 실패한 행 위치를 함께 반환합니다.
pub fn parse_rows<S: AsRef<str>>(
    rows: &[S],
    schema: &OffsetSchema,
) -> Result<Vec<PriceRecord>, (usize, MalformedRowError)> {
    rows.iter()
        .enumerate()
        .map(|(idx, row)| parse_record(row.as_ref(), schema).map_err(|e| (idx, e)))
        .collect()
}

/// 천 단위 구분자와 공백을 제거한 뒤 Decimal 로 변환합니다.
fn parse_price(field: &'static str, text: &str) -> Result<Decimal, MalformedRowError> {
    let cleaned: String = text
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    Decimal::from_str(&cleaned).map_err(|_| MalformedRowError::InvalidNumber {
        field,
        value: text.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MarketId;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    const HOSE_ROW: &str = "22/01/20241,165.201,170.051,160.001,168.40612.3K+0.42%";

    #[test]
    fn test_parse_hose_row() {
        let record = parse_record(HOSE_ROW, &MarketId::Hose.profile().schema).unwrap();

        assert_eq!(record.date, "22/01/2024");
        assert_eq!(record.open, dec!(1165.20));
        assert_eq!(record.high, dec!(1170.05));
        assert_eq!(record.low, dec!(1160.00));
        assert_eq!(record.close, dec!(1168.40));
        assert_eq!(record.volume, "612.3K");
        assert_eq!(record.percent_change, "+0.42%");
    }

    #[test]
    fn test_parse_hnx_row() {
        let row = "22/01/2024230.15231.00229.40230.8845.6M-0.31%";
        let record = parse_record(row, &MarketId::Hnx.profile().schema).unwrap();

        assert_eq!(record.open, dec!(230.15));
        assert_eq!(record.close, dec!(230.88));
        assert_eq!(record.volume, "45.6M");
        assert_eq!(record.percent_change, "-0.31%");
    }

    #[test]
    fn test_parse_upcom_row() {
        let row = "22/01/202488.4589.1088.0088.9012.1M+0.51%";
        let record = parse_record(row, &MarketId::Upcom.profile().schema).unwrap();

        assert_eq!(record.low, dec!(88.00));
        assert_eq!(record.volume, "12.1M");
    }

    #[test]
    fn test_empty_volume_at_minimum_width() {
        let row = "22/01/202488.4589.1088.0088.90+0.51%";
        let record = parse_record(row, &MarketId::Upcom.profile().schema).unwrap();
        assert_eq!(record.volume, "");
        assert_eq!(record.percent_change, "+0.51%");
    }

    #[test]
    fn test_truncated_row_is_rejected() {
        let err = parse_record("22/01/20241,165.20", &MarketId::Hose.profile().schema).unwrap_err();
        assert_eq!(
            err,
            MalformedRowError::TooShort {
                expected: 48,
                actual: 18
            }
        );
    }

    #[test]
    fn test_non_numeric_field_is_rejected() {
        let row = "22/01/2024N/A     1,170.051,160.001,168.40612.3K+0.42%";
        let err = parse_record(row, &MarketId::Hose.profile().schema).unwrap_err();
        assert!(matches!(err, MalformedRowError::InvalidNumber { field: "open", .. }));
    }

    #[test]
    fn test_offsets_are_character_based() {
        let row = "22/01/2024230.15231.00229.40230.88１２.３M-0.31%";
        let record = parse_record(row, &MarketId::Hnx.profile().schema).unwrap();
        assert_eq!(record.volume, "１２.３M");
    }

    #[test]
    fn test_parse_rows_reports_index() {
        let rows = vec![HOSE_ROW.to_string(), "short".to_string()];
        let (idx, err) = parse_rows(&rows, &MarketId::Hose.profile().schema).unwrap_err();
        assert_eq!(idx, 1);
        assert!(matches!(err, MalformedRowError::TooShort { .. }));
    }

    fn hose_row() -> impl Strategy<Value = String> {
        let price = (1000u32..10000, 0u32..100).prop_map(|(whole, cents)| {
            format!("{},{:03}.{:02}", whole / 1000, whole % 1000, cents)
        });
        (
            1u32..29,
            1u32..13,
            proptest::array::uniform4(price),
            "[0-9]{1,3}\\.[0-9][KM]",
            (-999i32..1000),
        )
            .prop_map(|(day, month, prices, volume, bps)| {
                let sign = if bps < 0 { '-' } else { '+' };
                let pct = format!("{}{}.{:02}%", sign, bps.abs() / 100, bps.abs() % 100);
                format!(
                    "{:02}/{:02}/2024{}{}{}",
                    day,
                    month,
                    prices.concat(),
                    volume,
                    pct
                )
            })
    }

    proptest! {
        #[test]
        fn prop_valid_hose_rows_parse(row in hose_row()) {
            let record = parse_record(&row, &MarketId::Hose.profile().schema).unwrap();
            prop_assert_eq!(record.date.chars().count(), 10);
            prop_assert!(record.open >= dec!(1000) && record.open < dec!(10000));
            prop_assert!(record.close >= dec!(1000) && record.close < dec!(10000));
            prop_assert!(!record.volume.is_empty());
            prop_assert_eq!(record.percent_change.chars().count(), TRAILING_FIELD_WIDTH);
        }

        #[test]
        fn prop_short_rows_fail(row in "[0-9,./]{0,47}") {
            let result = parse_record(&row, &MarketId::Hose.profile().schema);
            let is_too_short = matches!(result, Err(MalformedRowError::TooShort { .. }));
            prop_assert!(is_too_short);
        }
    }
}
