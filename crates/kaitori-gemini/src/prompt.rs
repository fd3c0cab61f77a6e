//! Japanese prompt templates. Every prompt asks for a bare JSON object.

use std::fmt::Write as _;

use kaitori_core::{DemographicField, RegionDemographics};

use crate::analysis::CandidateSummary;

const JSON_ONLY: &str = "回答はJSONオブジェクトのみとし、説明文やマークダウンは含めないでください。";

const SOURCES_INSTRUCTION: &str = "根拠とした資料を \"sources\": [{\"name\": 資料名, \"url\": URL}] として含めてください。URLが不明な場合は null にしてください。";

fn field_lines(fields: &[DemographicField]) -> String {
    fields.iter().fold(String::new(), |mut out, field| {
        let _ = writeln!(out, "- \"{}\": {}", field.key(), field.prompt_description());
        out
    })
}

/// Asks for a full demographic estimate of `region`.
#[must_use]
pub fn estimate_prompt(region: &str) -> String {
    format!(
        "あなたは日本の地域統計に詳しいアナリストです。\n\
         「{region}」の人口統計を推定し、次のキーを持つJSONで回答してください。\n\
         {fields}\
         {SOURCES_INSTRUCTION}\n\
         分からない項目は null にしてください。\n\
         {JSON_ONLY}",
        fields = field_lines(&DemographicField::ALL),
    )
}

/// Asks only for `fields`, which are missing from the official record.
#[must_use]
pub fn enrichment_prompt(region: &str, fields: &[DemographicField]) -> String {
    format!(
        "あなたは日本の地域統計に詳しいアナリストです。\n\
         「{region}」について、公的統計で取得できなかった次の項目だけを推定し、JSONで回答してください。\n\
         {fields}\
         {SOURCES_INSTRUCTION}\n\
         {JSON_ONLY}",
        fields = field_lines(fields),
    )
}

/// Renders the present metrics of a record as one line each.
fn describe(demographics: &RegionDemographics) -> String {
    let mut out = String::new();
    if let Some(p) = &demographics.population {
        let _ = writeln!(out, "- 人口: {}人", p.value);
    }
    if let Some(a) = &demographics.average_age {
        let _ = writeln!(out, "- 平均年齢: {}歳", a.value);
    }
    if let Some(d) = &demographics.age_distribution {
        let buckets: Vec<String> = d
            .value
            .iter()
            .map(|b| format!("{} {}%", b.range, b.percentage))
            .collect();
        let _ = writeln!(out, "- 年齢構成: {}", buckets.join(", "));
    }
    if let Some(g) = &demographics.gender_ratio {
        let _ = writeln!(out, "- 男女比: 男性{}% / 女性{}%", g.value.male, g.value.female);
    }
    if let Some(i) = &demographics.average_income {
        let _ = writeln!(out, "- 平均年収: {}万円", i.value);
    }
    if let Some(f) = &demographics.foreigner_ratio {
        let _ = writeln!(out, "- 外国人住民比率: {}%", f.value);
    }
    if out.is_empty() {
        out.push_str("- (統計データなし)\n");
    }
    out
}

/// Asks for a market narrative for a buyback event in the region.
#[must_use]
pub fn region_analysis_prompt(demographics: &RegionDemographics) -> String {
    format!(
        "あなたは出張買取イベントの出店戦略コンサルタントです。\n\
         「{region}」の人口統計は次の通りです。\n\
         {stats}\
         この地域で買取催事を開催する観点から分析し、次のキーを持つJSONで回答してください。\n\
         - \"summary\": 地域の概要（日本語、200字程度）\n\
         - \"strengths\": 強み（文字列の配列）\n\
         - \"concerns\": 懸念点（文字列の配列）\n\
         - \"recommendedCategories\": 買取が見込める品目（貴金属、ブランド品、着物など。文字列の配列）\n\
         {JSON_ONLY}",
        region = demographics.region,
        stats = describe(demographics),
    )
}

/// Asks for commentary on already-ranked candidate sites.
#[must_use]
pub fn store_commentary_prompt(region: &str, candidates: &[CandidateSummary]) -> String {
    let mut list = String::new();
    for (i, c) in candidates.iter().enumerate() {
        let _ = writeln!(
            list,
            "{}. {}（立地: {}, スコア: {}, ランク: {}）",
            i + 1,
            c.name,
            c.archetype.as_deref().unwrap_or("不明"),
            c.score,
            c.rank
        );
    }
    format!(
        "あなたは出張買取イベントの出店戦略コンサルタントです。\n\
         「{region}」で催事会場の候補を商圏スコア順に並べました。\n\
         {list}\
         上位候補を推す理由と注意点を簡潔にまとめ、{{\"commentary\": 文字列}} のJSONで回答してください。\n\
         {JSON_ONLY}"
    )
}
