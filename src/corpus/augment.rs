//! Offline corpus augmentation.
//!
//! Synthesizes extra patterns for intents whose tag mentions a known domain
//! keyword, by filling phrase templates with domain terms. Augmentation is a
//! preprocessing step: it produces a new corpus that is saved and later loaded
//! like any other, it never runs at query time.

use std::collections::HashSet;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::corpus::{Intent, IntentCorpus};
use crate::error::{IntentError, Result};

/// Phrase templates; `{}` is replaced by a term.
pub const DEFAULT_TEMPLATES: &[&str] = &[
    "bagaimana cara {}",
    "jelaskan tentang {}",
    "apa itu {}",
    "cara analisis {}",
    "prosedur {}",
    "metode {}",
    "teknik {}",
    "panduan {}",
    "tutorial {}",
    "contoh {}",
];

const VIBRATION_TERMS: &[&str] = &[
    "vibration", "getaran", "oscillation", "vibrasi", "shake", "goyangan",
    "acceleration", "percepatan", "frequency", "frekuensi", "amplitude", "amplitudo",
    "bearing", "bantalan", "misalignment", "unbalance", "looseness",
];

const MCSA_TERMS: &[&str] = &[
    "current", "arus", "motor", "electrical", "listrik", "rotor", "stator",
    "broken bar", "eccentricity", "load", "beban", "power", "daya",
    "harmonics", "harmonik", "sideband", "spektrum",
];

const DGA_TERMS: &[&str] = &[
    "gas", "dissolved", "terlarut", "transformer", "trafo", "oil", "minyak",
    "hydrogen", "hidrogen", "methane", "metana", "acetylene", "asetilen",
    "ethylene", "etilen", "carbon monoxide", "karbon monoksida",
];

const MAINTENANCE_TERMS: &[&str] = &[
    "maintenance", "perawatan", "service", "repair", "perbaikan", "schedule",
    "jadwal", "preventive", "predictive", "corrective", "emergency",
    "reliability", "keandalan", "failure", "kegagalan",
];

/// Generates `count` patterns from `terms` for intents whose tag contains one
/// of `keywords`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AugmentRule {
    pub keywords: Vec<String>,
    pub terms: Vec<String>,
    pub count: usize,
}

impl AugmentRule {
    pub fn new(keywords: &[&str], terms: &[&str], count: usize) -> Self {
        AugmentRule {
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            terms: terms.iter().map(|t| t.to_string()).collect(),
            count,
        }
    }

    /// Whether this rule applies to the given tag.
    pub fn matches(&self, tag: &str) -> bool {
        self.keywords.iter().any(|keyword| tag.contains(keyword.as_str()))
    }

    /// The predictive-maintenance rules: vibration, MCSA, DGA and maintenance.
    pub fn defaults() -> Vec<AugmentRule> {
        vec![
            AugmentRule::new(&["vibration", "getaran"], VIBRATION_TERMS, 8),
            AugmentRule::new(&["mcsa", "current"], MCSA_TERMS, 6),
            AugmentRule::new(&["dga", "gas"], DGA_TERMS, 6),
            AugmentRule::new(&["maintenance"], MAINTENANCE_TERMS, 10),
        ]
    }
}

/// Diagnostic intents appended by the default augmentation run.
pub fn diagnostic_intents() -> Vec<Intent> {
    vec![
        Intent::new(
            "bearing_diagnosis",
            &[
                "bearing rusak",
                "bantalan bermasalah",
                "bearing noise",
                "suara bearing aneh",
                "inner race defect",
                "outer race defect",
                "ball defect",
                "cage defect",
                "bearing frequency",
                "BPFI BPFO",
            ],
            &[
                "Untuk diagnosis bearing, perhatikan frekuensi karakteristik: BPFI (inner race), BPFO (outer race), BSF (ball spin), FTF (cage). Amplitudo tinggi pada frekuensi ini menunjukkan defect.",
                "Bearing rusak ditandai dengan peningkatan amplitudo pada bearing frequencies. Gunakan envelope analysis untuk deteksi dini.",
                "Analisis spektrum vibrasi pada range 1-10 kHz. Peak pada bearing characteristic frequencies mengindikasikan kerusakan spesifik.",
            ],
        ),
        Intent::new(
            "unbalance_diagnosis",
            &[
                "unbalance",
                "ketidakseimbangan",
                "rotor unbalance",
                "static unbalance",
                "dynamic unbalance",
                "balancing",
                "penyeimbangan",
            ],
            &[
                "Unbalance terdeteksi dari peak tinggi pada 1x RPM (running speed). Static unbalance: peak radial sama semua arah. Dynamic unbalance: peak axial berbeda.",
                "Untuk koreksi unbalance, gunakan metode trial weight. Tambahkan massa trial, ukur perubahan amplitudo dan phase.",
                "Unbalance severity berdasarkan ISO 21940: Grade G2.5 untuk motor presisi, G6.3 untuk motor industri standar.",
            ],
        ),
        Intent::new(
            "motor_fault_diagnosis",
            &[
                "motor fault",
                "kerusakan motor",
                "motor problem",
                "motor diagnostic",
                "electric motor analysis",
                "induction motor fault",
            ],
            &[
                "Fault motor meliputi: electrical (broken rotor bar, stator winding), mechanical (bearing, unbalance), dan magnetic (eccentricity). Gunakan kombinasi MCSA dan vibration analysis.",
                "Broken rotor bar: sideband di (1±2s)f dimana s=slip. Stator fault: harmonik ganjil. Eccentricity: sideband di f±fr.",
                "Motor diagnostic matrix: vibration untuk mechanical fault, current signature untuk electrical fault, thermal untuk insulation degradation.",
            ],
        ),
    ]
}

/// Template-based pattern synthesizer.
#[derive(Debug, Clone)]
pub struct PatternAugmenter {
    rules: Vec<AugmentRule>,
    templates: Vec<String>,
    extra_intents: Vec<Intent>,
    rng: StdRng,
}

impl PatternAugmenter {
    /// An augmenter with the given rules, the default templates and no extra
    /// intents.
    pub fn new(rules: Vec<AugmentRule>, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        PatternAugmenter {
            rules,
            templates: DEFAULT_TEMPLATES.iter().map(|t| t.to_string()).collect(),
            extra_intents: Vec::new(),
            rng,
        }
    }

    /// Default predictive-maintenance rules plus the diagnostic intents.
    pub fn with_defaults(seed: Option<u64>) -> Self {
        Self::new(AugmentRule::defaults(), seed).with_extra_intents(diagnostic_intents())
    }

    pub fn with_templates(mut self, templates: Vec<String>) -> Self {
        self.templates = templates;
        self
    }

    pub fn with_extra_intents(mut self, intents: Vec<Intent>) -> Self {
        self.extra_intents = intents;
        self
    }

    pub fn rules(&self) -> &[AugmentRule] {
        &self.rules
    }

    /// Produce an augmented copy of `corpus`.
    pub fn augment(&mut self, corpus: &IntentCorpus) -> Result<IntentCorpus> {
        if self.templates.is_empty() {
            return Err(IntentError::invalid_config("augmenter has no templates"));
        }

        let mut intents = corpus.intents().to_vec();
        let mut generated_total = 0;

        for intent in &mut intents {
            let Some(rule) = self.rules.iter().find(|rule| rule.matches(&intent.tag)) else {
                continue;
            };

            let generated = generate(&self.templates, rule, &mut self.rng);
            generated_total += generated.len();
            debug!(tag = %intent.tag, generated = generated.len(), "augmenting intent");

            let existing = std::mem::take(&mut intent.patterns);
            let mut seen = HashSet::new();
            intent.patterns = generated
                .into_iter()
                .chain(existing)
                .filter(|pattern| seen.insert(pattern.clone()))
                .collect();
        }

        let mut added = 0;
        for extra in &self.extra_intents {
            if intents.iter().all(|intent| intent.tag != extra.tag) {
                intents.push(extra.clone());
                added += 1;
            }
        }

        info!(
            generated = generated_total,
            added_intents = added,
            "augmented corpus"
        );
        IntentCorpus::new(intents)
    }
}

fn generate(templates: &[String], rule: &AugmentRule, rng: &mut StdRng) -> Vec<String> {
    if rule.terms.is_empty() {
        return Vec::new();
    }

    let mut generated = Vec::with_capacity(rule.count);
    for _ in 0..rule.count {
        if let (Some(template), Some(term)) = (templates.choose(rng), rule.terms.choose(rng)) {
            generated.push(template.replace("{}", term));
        }
    }
    generated
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> IntentCorpus {
        IntentCorpus::new(vec![
            Intent::new("vibration_analysis", &["analisis getaran"], &["Ukur getaran."]),
            Intent::new("dga_analysis", &["apa itu dga"], &["DGA menganalisis gas."]),
            Intent::new("greeting", &["halo"], &["Halo!"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_rule_matching() {
        let rules = AugmentRule::defaults();
        assert!(rules[0].matches("vibration_analysis"));
        assert!(rules[1].matches("mcsa_analysis"));
        assert!(rules[2].matches("gas_analysis"));
        assert!(!rules[3].matches("greeting"));
    }

    #[test]
    fn test_augment_prepends_and_keeps_originals() {
        let mut augmenter = PatternAugmenter::new(AugmentRule::defaults(), Some(7));
        let augmented = augmenter.augment(&corpus()).unwrap();

        let vibration = augmented.get("vibration_analysis").unwrap();
        assert!(vibration.patterns.len() > 1);
        assert!(vibration.patterns.len() <= 9);
        assert_eq!(vibration.patterns.last().unwrap(), "analisis getaran");

        let greeting = augmented.get("greeting").unwrap();
        assert_eq!(greeting.patterns, ["halo"]);
    }

    #[test]
    fn test_generated_patterns_use_rule_terms() {
        let mut augmenter = PatternAugmenter::new(AugmentRule::defaults(), Some(3));
        let augmented = augmenter.augment(&corpus()).unwrap();

        let dga = augmented.get("dga_analysis").unwrap();
        for pattern in &dga.patterns[..dga.patterns.len() - 1] {
            assert!(
                DGA_TERMS.iter().any(|term| pattern.ends_with(term)),
                "unexpected pattern {pattern}"
            );
        }
    }

    #[test]
    fn test_no_duplicate_patterns() {
        let rule = AugmentRule::new(&["vibration"], &["getaran"], 20);
        let mut augmenter = PatternAugmenter::new(vec![rule], Some(1))
            .with_templates(vec!["analisis {}".to_string()]);
        let augmented = augmenter.augment(&corpus()).unwrap();

        let vibration = augmented.get("vibration_analysis").unwrap();
        assert_eq!(vibration.patterns, ["analisis getaran"]);
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let first = PatternAugmenter::new(AugmentRule::defaults(), Some(42))
            .augment(&corpus())
            .unwrap();
        let second = PatternAugmenter::new(AugmentRule::defaults(), Some(42))
            .augment(&corpus())
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_extra_intents_appended_once() {
        let mut augmenter = PatternAugmenter::with_defaults(Some(5));
        let once = augmenter.augment(&corpus()).unwrap();
        assert_eq!(once.len(), 6);
        assert!(once.get("bearing_diagnosis").is_some());

        let twice = augmenter.augment(&once).unwrap();
        assert_eq!(twice.len(), 6);
    }
}
