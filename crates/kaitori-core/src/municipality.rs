//! Static lookup of major Japanese municipalities.
//!
//! Maps a free-form region name to the five-digit local government code used
//! by e-Stat's `cdArea` parameter. Land area is carried so that ring
//! populations around a site can be estimated from municipal density.

use crate::CoreError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Municipality {
    pub name: &'static str,
    pub prefecture: &'static str,
    /// Five-digit local government code (JIS X 0402 without check digit).
    pub code: &'static str,
    pub area_km2: f64,
}

impl Municipality {
    /// Display name including prefecture, e.g. `"東京都渋谷区"`.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}{}", self.prefecture, self.name)
    }
}

const fn m(
    name: &'static str,
    prefecture: &'static str,
    code: &'static str,
    area_km2: f64,
) -> Municipality {
    Municipality {
        name,
        prefecture,
        code,
        area_km2,
    }
}

pub const MUNICIPALITIES: &[Municipality] = &[
    m("札幌市", "北海道", "01100", 1121.3),
    m("函館市", "北海道", "01202", 677.8),
    m("旭川市", "北海道", "01204", 747.6),
    m("青森市", "青森県", "02201", 824.6),
    m("盛岡市", "岩手県", "03201", 886.5),
    m("仙台市", "宮城県", "04100", 786.3),
    m("秋田市", "秋田県", "05201", 906.1),
    m("山形市", "山形県", "06201", 381.6),
    m("福島市", "福島県", "07201", 767.7),
    m("郡山市", "福島県", "07203", 757.2),
    m("いわき市", "福島県", "07204", 1232.0),
    m("水戸市", "茨城県", "08201", 217.3),
    m("つくば市", "茨城県", "08220", 283.7),
    m("宇都宮市", "栃木県", "09201", 416.9),
    m("前橋市", "群馬県", "10201", 311.6),
    m("高崎市", "群馬県", "10202", 459.2),
    m("さいたま市", "埼玉県", "11100", 217.4),
    m("川越市", "埼玉県", "11201", 109.1),
    m("川口市", "埼玉県", "11203", 61.9),
    m("千葉市", "千葉県", "12100", 271.8),
    m("船橋市", "千葉県", "12204", 85.6),
    m("柏市", "千葉県", "12217", 114.7),
    m("千代田区", "東京都", "13101", 11.66),
    m("中央区", "東京都", "13102", 10.21),
    m("港区", "東京都", "13103", 20.36),
    m("新宿区", "東京都", "13104", 18.22),
    m("文京区", "東京都", "13105", 11.29),
    m("台東区", "東京都", "13106", 10.11),
    m("墨田区", "東京都", "13107", 13.77),
    m("江東区", "東京都", "13108", 42.99),
    m("品川区", "東京都", "13109", 22.84),
    m("目黒区", "東京都", "13110", 14.67),
    m("大田区", "東京都", "13111", 61.86),
    m("世田谷区", "東京都", "13112", 58.05),
    m("渋谷区", "東京都", "13113", 15.11),
    m("中野区", "東京都", "13114", 15.59),
    m("杉並区", "東京都", "13115", 34.06),
    m("豊島区", "東京都", "13116", 13.01),
    m("北区", "東京都", "13117", 20.61),
    m("荒川区", "東京都", "13118", 10.16),
    m("板橋区", "東京都", "13119", 32.22),
    m("練馬区", "東京都", "13120", 48.08),
    m("足立区", "東京都", "13121", 53.25),
    m("葛飾区", "東京都", "13122", 34.80),
    m("江戸川区", "東京都", "13123", 49.90),
    m("八王子市", "東京都", "13201", 186.4),
    m("町田市", "東京都", "13209", 71.6),
    m("横浜市", "神奈川県", "14100", 437.7),
    m("川崎市", "神奈川県", "14130", 143.0),
    m("相模原市", "神奈川県", "14150", 328.9),
    m("横須賀市", "神奈川県", "14201", 100.8),
    m("新潟市", "新潟県", "15100", 726.5),
    m("富山市", "富山県", "16201", 1241.8),
    m("金沢市", "石川県", "17201", 468.8),
    m("福井市", "福井県", "18201", 536.4),
    m("甲府市", "山梨県", "19201", 212.5),
    m("長野市", "長野県", "20201", 834.8),
    m("岐阜市", "岐阜県", "21201", 203.6),
    m("静岡市", "静岡県", "22100", 1411.8),
    m("浜松市", "静岡県", "22130", 1558.1),
    m("名古屋市", "愛知県", "23100", 326.5),
    m("豊田市", "愛知県", "23211", 918.3),
    m("津市", "三重県", "24201", 711.2),
    m("大津市", "滋賀県", "25201", 464.5),
    m("京都市", "京都府", "26100", 827.8),
    m("大阪市", "大阪府", "27100", 225.3),
    m("堺市", "大阪府", "27140", 149.8),
    m("東大阪市", "大阪府", "27227", 61.8),
    m("神戸市", "兵庫県", "28100", 557.0),
    m("姫路市", "兵庫県", "28201", 534.6),
    m("奈良市", "奈良県", "29201", 276.9),
    m("和歌山市", "和歌山県", "30201", 208.8),
    m("鳥取市", "鳥取県", "31201", 765.3),
    m("松江市", "島根県", "32201", 572.9),
    m("岡山市", "岡山県", "33100", 789.9),
    m("広島市", "広島県", "34100", 906.7),
    m("福山市", "広島県", "34207", 518.1),
    m("下関市", "山口県", "35201", 716.1),
    m("山口市", "山口県", "35203", 1023.2),
    m("徳島市", "徳島県", "36201", 191.5),
    m("高松市", "香川県", "37201", 375.4),
    m("松山市", "愛媛県", "38201", 429.4),
    m("高知市", "高知県", "39201", 309.0),
    m("北九州市", "福岡県", "40100", 492.5),
    m("福岡市", "福岡県", "40130", 343.5),
    m("佐賀市", "佐賀県", "41201", 431.8),
    m("長崎市", "長崎県", "42201", 405.9),
    m("熊本市", "熊本県", "43100", 390.3),
    m("大分市", "大分県", "44201", 502.4),
    m("宮崎市", "宮崎県", "45201", 643.7),
    m("鹿児島市", "鹿児島県", "46201", 547.6),
    m("那覇市", "沖縄県", "47201", 41.4),
];

const ADMIN_SUFFIXES: &[char] = &['市', '区', '町', '村', '都', '道', '府', '県'];

/// Resolves a region name to a municipality.
///
/// Tries, in order: exact name, prefecture-qualified name (`"東京都渋谷区"`),
/// then a prefix match after stripping one trailing administrative suffix
/// (`"横浜"` or `"横浜市"` both resolve to 横浜市).
///
/// # Errors
///
/// Returns [`CoreError::UnknownRegion`] if nothing in the table matches.
pub fn resolve_municipality(region: &str) -> Result<&'static Municipality, CoreError> {
    let query = region.trim();
    if query.is_empty() {
        return Err(CoreError::UnknownRegion(region.to_string()));
    }

    if let Some(found) = MUNICIPALITIES.iter().find(|m| m.name == query) {
        return Ok(found);
    }

    if let Some(found) = MUNICIPALITIES
        .iter()
        .find(|m| query.strip_prefix(m.prefecture) == Some(m.name))
    {
        return Ok(found);
    }

    let stripped = query.strip_suffix(ADMIN_SUFFIXES).unwrap_or(query);
    if !stripped.is_empty() {
        if let Some(found) = MUNICIPALITIES.iter().find(|m| m.name.starts_with(stripped)) {
            return Ok(found);
        }
    }

    Err(CoreError::UnknownRegion(region.to_string()))
}

/// Finds the municipality mentioned in a free-form address.
///
/// Addresses run from larger to smaller units, so the name that appears
/// first in `text` wins: `"札幌市中央区"` is Sapporo, not Tokyo's 中央区.
/// Names starting at the same position go to the longest one.
#[must_use]
pub fn find_municipality_in_text(text: &str) -> Option<&'static Municipality> {
    MUNICIPALITIES
        .iter()
        .filter_map(|m| text.find(m.name).map(|pos| (pos, m)))
        .min_by(|(a_pos, a), (b_pos, b)| {
            a_pos
                .cmp(b_pos)
                .then_with(|| b.name.len().cmp(&a.name.len()))
        })
        .map(|(_, m)| m)
}
