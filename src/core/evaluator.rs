use crate::domain::model::Verdict;

pub const RISK_KEYWORDS: [&str; 4] = ["vulnerability", "exploit", "high-risk", "scam"];

/// 任何關鍵字（不分大小寫）出現即判定為 PossibleScam
pub fn evaluate(analysis: &str) -> Verdict {
    let lowercase_analysis = analysis.to_lowercase();

    if RISK_KEYWORDS
        .iter()
        .any(|keyword| lowercase_analysis.contains(keyword))
    {
        Verdict::PossibleScam
    } else {
        Verdict::Safe
    }
}
