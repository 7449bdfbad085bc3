//! Prompt construction for the two analysis phases

use dermal_common::QuizAnswers;

const LOG_FORMAT_RULES: &str = "Each line must be in this exact format:
HH:MM:SS [TAG] MESSAGE
Use tags: [OK] for success/completed step, [..] for in progress, [!!] for notable finding. \
Use realistic short technical messages like: AUTHENTICATING_BIOMETRIC_ENCRYPTION, \
UV_SPECTRUM_MAPPING_INITIALIZED, ANALYZING_NASOLABIAL_VECTORS, DETECTING_SUB_DURMAL_INFLAMMATION, \
IRREGULAR_COLLAGEN_PATTERN_DETECTED, CROSS_REF_GENETIC_PROFILE_ID_7, \
BARRIER_INTEGRITY_INDEX_FINALIZED, CALCULATING_BIO_AGE_VARIANCE.
Output exactly 10-12 lines, one per line. Use current time format for HH:MM:SS. No other text.";

const NOT_SPECIFIED: &str = "Not specified";

/// Phase A prompt: diagnostic log lines
pub fn diagnostic_log_prompt(with_image: bool) -> String {
    if with_image {
        format!(
            "You are a clinical dermal analysis system. Analyze the attached face image and output \
             ONLY a list of diagnostic log lines that reflect what you observe: skin texture, tone, \
             visible concerns (e.g. under-eye, nasolabial, forehead), and any signs of sun damage \
             or aging. {}",
            LOG_FORMAT_RULES
        )
    } else {
        format!(
            "You are a clinical dermal analysis system. Output ONLY a list of diagnostic log lines. {}",
            LOG_FORMAT_RULES
        )
    }
}

/// Phase B prompt: structured report conditioned on the quiz
pub fn report_prompt(quiz: &QuizAnswers, with_image: bool) -> String {
    let answer = |value: &Option<String>| value.clone().unwrap_or_else(|| NOT_SPECIFIED.to_string());

    let basis = if with_image {
        "Based on the attached face image and"
    } else {
        "Based on"
    };
    let image_guidance = if with_image {
        "Use what you see in the face image (skin tone, texture, visible concerns, areas of aging \
         or damage) to inform the report. Be specific to what you observe.\n"
    } else {
        ""
    };

    format!(
        "You are a clinical dermal AI. {basis} these intake answers, generate a believable, \
         personalized skin analysis report.
Quiz answers:
- Genetic aging pattern: {genetic}
- Environmental exposure: {exposure}
- Skin state on waking: {waking}
{image_guidance}
Return a report with:
- profileId: \"SK-\" followed by 5 digits (e.g. SK-77202)
- headline: one of \"Bio-Age Accelerated\", \"Bio-Age Aligned\", \"Bio-Age Optimized\"
- description: 1-2 sentences about structural/cellular findings; mention biological vs chronological age if headline is Accelerated
- bioAgeVariance: e.g. \"+4.2y\" or \"0y\" or \"-1.2y\"
- metrics: uvDamage (0-100 value, trend up/down/neutral), hydration (0-100), inflammation (High/Moderate/Low), dermalBioAge (same as bioAgeVariance)
- findings: array of 2 objects with id (short slug), title (e.g. \"Dermal Thinning\", \"Lipid Loss\", \"UV Damage\"), icon (\"warning\" or \"alert\"), description (1-2 sentences, clinical tone, can mention projected % or timeline)
Keep descriptions objective and scientific. No product recommendations.",
        basis = basis,
        genetic = answer(&quiz.genetic_aging_pattern),
        exposure = answer(&quiz.environmental_exposure),
        waking = answer(&quiz.skin_state_on_waking),
        image_guidance = image_guidance,
    )
}
