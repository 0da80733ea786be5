//! 가격 레코드와 시트 셀 값.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

/// 스크랩한 원본 행 텍스트 (행 요소의 textContent 그대로).
pub type RawRow = String;

/// 하루치 지수 가격 레코드.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceRecord {
    /// 거래일 (원천 페이지 표기 그대로)
    pub date: String,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    /// 거래량 (예: "1.2K", 로케일 표기 그대로)
    pub volume: String,
    /// 등락률 (부호와 % 포함)
    pub percent_change: String,
}

impl PriceRecord {
    /// 시트 한 행으로 변환합니다 (날짜, 시가, 고가, 저가, 종가, 거래량, 등락률).
    pub fn to_cells(&self) -> Vec<CellValue> {
        vec![
            CellValue::Text(self.date.clone()),
            CellValue::Number(self.open),
            CellValue::Number(self.high),
            CellValue::Number(self.low),
            CellValue::Number(self.close),
            CellValue::Text(self.volume.clone()),
            CellValue::Text(self.percent_change.clone()),
        ]
    }

    /// 예측 요청 페이로드용 쉼표 구분 표현.
    pub fn to_payload_fields(&self) -> String {
        [
            self.date.clone(),
            self.open.normalize().to_string(),
            self.high.normalize().to_string(),
            self.low.normalize().to_string(),
            self.close.normalize().to_string(),
            self.volume.clone(),
            self.percent_change.clone(),
        ]
        .join(",")
    }
}

/// 모든 레코드를 하나의 텍스트 페이로드로 연결합니다.
pub fn format_payload(records: &[PriceRecord]) -> String {
    records
        .iter()
        .map(PriceRecord::to_payload_fields)
        .collect::<Vec<_>>()
        .join(",")
}

/// 시트에 기록할 셀 값.
///
/// 숫자는 RAW 입력 모드에서도 숫자로 저장되도록 JSON number 로 직렬화합니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellValue {
    Text(String),
    Number(Decimal),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Text(s) => serializer.serialize_str(s),
            CellValue::Number(d) => match d.to_f64() {
                Some(f) => serializer.serialize_f64(f),
                None => serializer.serialize_str(&d.to_string()),
            },
        }
    }
}

/// 하나의 범위 쓰기 요청.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RangeWrite {
    /// 시트 이름을 포함한 A1 표기 범위
    pub range: String,
    pub values: Vec<Vec<CellValue>>,
}

impl RangeWrite {
    pub fn new(range: impl Into<String>, values: Vec<Vec<CellValue>>) -> Self {
        Self {
            range: range.into(),
            values,
        }
    }

    /// 단일 텍스트 셀 쓰기.
    pub fn single(range: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(range, vec![vec![CellValue::text(value)]])
    }
}
