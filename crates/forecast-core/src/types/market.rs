//! 시장 식별자와 시장 프로파일 테이블.
//!
//! 세 시장(HOSE, HNX, UPCOM)은 같은 업데이트 흐름을 공유하고
//! 원천 페이지, 오프셋 스키마, 시트 범위만 다릅니다.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 행 끝에 항상 위치하는 등락률 필드의 문자 수.
pub const TRAILING_FIELD_WIDTH: usize = 6;

/// 시장 식별자.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MarketId {
    /// 호찌민 증권거래소 (VN-Index)
    Hose,
    /// 하노이 증권거래소 (HNX-Index)
    Hnx,
    /// 비상장 공기업 시장 (UPCoM-Index)
    Upcom,
}

impl MarketId {
    /// 지원하는 모든 시장.
    pub const ALL: [MarketId; 3] = [MarketId::Hose, MarketId::Hnx, MarketId::Upcom];

    /// 시트 표시 라벨 (지표 셀 값과 동일).
    pub fn label(&self) -> &'static str {
        match self {
            MarketId::Hose => "HOSE",
            MarketId::Hnx => "HNX",
            MarketId::Upcom => "UPCOM",
        }
    }

    /// 지표 셀 값에서 시장을 결정합니다.
    ///
    /// 대소문자를 구분하는 정확한 일치만 허용합니다. 셀 앞뒤 공백은 무시합니다.
    pub fn from_indicator(value: &str) -> Option<Self> {
        match value.trim() {
            "HOSE" => Some(MarketId::Hose),
            "HNX" => Some(MarketId::Hnx),
            "UPCOM" => Some(MarketId::Upcom),
            _ => None,
        }
    }

    /// 이 시장의 정적 프로파일.
    pub fn profile(&self) -> &'static MarketProfile {
        match self {
            MarketId::Hose => &MARKET_PROFILES[0],
            MarketId::Hnx => &MARKET_PROFILES[1],
            MarketId::Upcom => &MARKET_PROFILES[2],
        }
    }
}

impl fmt::Display for MarketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MarketId {
    type Err = String;

    /// CLI 인자용 파싱. 지표 셀과 달리 대소문자를 구분하지 않습니다.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "HOSE" => Ok(MarketId::Hose),
            "HNX" => Ok(MarketId::Hnx),
            "UPCOM" => Ok(MarketId::Upcom),
            _ => Err(format!("Unknown market: {}", s)),
        }
    }
}

/// 행 텍스트 내 하나의 필드 구간 (문자 단위, 끝 미포함).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpan {
    pub start: usize,
    pub end: usize,
}

impl FieldSpan {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub const fn width(&self) -> usize {
        self.end - self.start
    }
}

/// 시장별 고정 문자 오프셋 스키마.
///
/// 날짜와 네 개의 가격 필드는 고정 폭이며, 거래량은 마지막 가격 필드 끝부터
/// `len - 6` 까지, 등락률은 마지막 6자입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetSchema {
    pub date: FieldSpan,
    pub open: FieldSpan,
    pub high: FieldSpan,
    pub low: FieldSpan,
    pub close: FieldSpan,
}

impl OffsetSchema {
    /// 날짜 폭과 가격 필드 폭으로 연속된 스키마를 생성합니다.
    pub const fn uniform(date_width: usize, price_width: usize) -> Self {
        let open = date_width;
        let high = open + price_width;
        let low = high + price_width;
        let close = low + price_width;
        Self {
            date: FieldSpan::new(0, date_width),
            open: FieldSpan::new(open, high),
            high: FieldSpan::new(high, low),
            low: FieldSpan::new(low, close),
            close: FieldSpan::new(close, close + price_width),
        }
    }

    /// 고정 폭 필드가 끝나는 위치 (거래량 시작 위치).
    pub const fn fixed_width(&self) -> usize {
        self.close.end
    }

    /// 파싱 가능한 최소 행 길이.
    pub const fn min_row_len(&self) -> usize {
        self.fixed_width() + TRAILING_FIELD_WIDTH
    }

    /// 고정 필드가 틈이나 겹침 없이 0부터 이어지는지 확인합니다.
    pub fn is_contiguous(&self) -> bool {
        let spans = [self.date, self.open, self.high, self.low, self.close];
        spans[0].start == 0
            && spans.iter().all(|s| s.width() > 0)
            && spans.windows(2).all(|w| w[0].end == w[1].start)
    }
}

/// 시트 내 목적지 범위 (시트 이름 제외).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetLayout {
    /// 현재 선택된 시장 지표 셀
    pub indicator_cell: &'static str,
    /// 가격 레코드 범위
    pub rows_range: &'static str,
    /// 예측 결과 셀
    pub forecast_cell: &'static str,
    /// 매매 신호 셀
    pub signal_cell: &'static str,
}

impl SheetLayout {
    pub const DEFAULT: SheetLayout = SheetLayout {
        indicator_cell: "A1",
        rows_range: "A3:G",
        forecast_cell: "I22",
        signal_cell: "I23",
    };
}

/// 시트 이름을 붙인 A1 표기 범위를 만듭니다.
pub fn qualified_range(sheet_name: &str, range: &str) -> String {
    format!("{}!{}", sheet_name, range)
}

/// 시장 프로파일 (프로세스 전역, 읽기 전용).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketProfile {
    pub market: MarketId,
    /// 원천 사이트 기준 과거 데이터 페이지 경로
    pub source_path: &'static str,
    pub schema: OffsetSchema,
    pub layout: SheetLayout,
}

impl MarketProfile {
    /// 원천 사이트 기준 URL과 결합한 페이지 URL.
    pub fn source_url(&self, base_url: &str) -> String {
        format!("{}{}", base_url.trim_end_matches('/'), self.source_path)
    }
}

/// 시장 프로파일 테이블.
pub static MARKET_PROFILES: [MarketProfile; 3] = [
    MarketProfile {
        market: MarketId::Hose,
        source_path: "/indices/vn-historical-data",
        schema: OffsetSchema::uniform(10, 8),
        layout: SheetLayout::DEFAULT,
    },
    MarketProfile {
        market: MarketId::Hnx,
        source_path: "/indices/hnx-historical-data",
        schema: OffsetSchema::uniform(10, 6),
        layout: SheetLayout::DEFAULT,
    },
    MarketProfile {
        market: MarketId::Upcom,
        source_path: "/indices/unlisted-public-company-market-historical-data",
        schema: OffsetSchema::uniform(10, 5),
        layout: SheetLayout::DEFAULT,
    },
];
