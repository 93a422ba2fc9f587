//! Follow-up question bank
//!
//! Curated follow-up questions keyed by information point. Selection is
//! weighted-random; a seeded mode derives the RNG from the inputs so the same
//! message always yields the same question.

use std::collections::HashMap;

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::cluster::ClusterId;

/// One follow-up question and its relative selection weight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionTemplate {
    pub text: String,
    #[serde(default = "default_weight")]
    pub weight: u32,
}

fn default_weight() -> u32 {
    1
}

impl QuestionTemplate {
    pub fn new(text: impl Into<String>, weight: u32) -> Self {
        Self {
            text: text.into(),
            weight,
        }
    }
}

/// How a question is picked among a point's templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionSelection {
    /// Fresh entropy per pick
    #[default]
    Random,
    /// Deterministic pick derived from the seed and the inputs
    Seeded(u64),
}

/// Question templates for every information point.
#[derive(Debug, Clone, Default)]
pub struct QuestionBank {
    templates: HashMap<String, Vec<QuestionTemplate>>,
}

impl QuestionBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// The curated Swedish bank for the built-in catalog.
    pub fn builtin() -> Self {
        let mut bank = Self::new();
        for (key, questions) in BUILTIN_QUESTIONS {
            bank.set(
                key,
                questions
                    .iter()
                    .map(|(text, weight)| QuestionTemplate::new(*text, *weight))
                    .collect(),
            );
        }
        bank
    }

    /// Replace the templates for `point_key`.
    pub fn set(&mut self, point_key: &str, templates: Vec<QuestionTemplate>) {
        self.templates.insert(point_key.to_string(), templates);
    }

    pub fn templates(&self, point_key: &str) -> &[QuestionTemplate] {
        self.templates
            .get(point_key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Pick a follow-up question for a missing point.
    ///
    /// Falls back to a question built from the point description when the
    /// bank has nothing usable for the key.
    pub fn pick(
        &self,
        selection: QuestionSelection,
        cluster: ClusterId,
        point_key: &str,
        point_description: &str,
        message: &str,
    ) -> String {
        let templates = self.templates(point_key);
        let weights: Vec<u32> = templates.iter().map(|t| t.weight).collect();
        let Ok(dist) = WeightedIndex::<u32>::new(&weights) else {
            return format!(
                "Kan du berätta mer om följande: {}?",
                point_description.to_lowercase()
            );
        };

        let idx = match selection {
            QuestionSelection::Random => dist.sample(&mut rand::thread_rng()),
            QuestionSelection::Seeded(seed) => {
                let mut rng = StdRng::seed_from_u64(selection_seed(seed, cluster, point_key, message));
                dist.sample(&mut rng)
            }
        };
        templates[idx].text.clone()
    }
}

/// FNV-1a fold of the seed and the selection inputs.
///
/// Fixed arithmetic, so a given seed picks the same question on every build.
fn selection_seed(seed: u64, cluster: ClusterId, point_key: &str, message: &str) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

    seed.to_le_bytes()
        .into_iter()
        .chain([cluster.position() as u8, 0xff])
        .chain(point_key.bytes())
        .chain([0xff])
        .chain(message.bytes())
        .fold(FNV_OFFSET, |hash, b| {
            (hash ^ u64::from(b)).wrapping_mul(FNV_PRIME)
        })
}

/// Built-in follow-ups: (point key, [(question, weight)]).
const BUILTIN_QUESTIONS: &[(&str, &[(&str, u32)])] = &[
    // pain-point
    (
        "problem_description",
        &[
            ("Kan du beskriva det största problemet ni brottas med idag?", 3),
            ("Vad är det som inte fungerar som det ska i dag?", 2),
            ("Vilken process eller arbetsuppgift skapar mest frustration?", 1),
        ],
    ),
    (
        "cost_impact",
        &[
            ("Ungefär vad kostar problemet er per månad, i tid eller pengar?", 3),
            ("Har ni räknat på vad det här kostar verksamheten?", 2),
        ],
    ),
    (
        "frequency",
        &[
            ("Hur ofta uppstår problemet, dagligen, varje vecka eller mer sällan?", 2),
            ("Är det här något som händer hela tiden eller vid vissa tillfällen?", 1),
        ],
    ),
    (
        "affected_parties",
        &[
            ("Vilka personer eller avdelningar drabbas mest av problemet?", 2),
            ("Påverkas era kunder av det här, eller främst interna team?", 1),
        ],
    ),
    // impact-urgency
    (
        "business_impact",
        &[
            ("Hur påverkar problemet verksamheten i stort?", 2),
            ("Vad går ni miste om, till exempel kunder eller intäkter, på grund av detta?", 1),
        ],
    ),
    (
        "urgency_level",
        &[
            ("Hur brådskande är det att få det här löst?", 2),
            ("Var på prioriteringslistan hamnar det här jämfört med annat?", 1),
        ],
    ),
    (
        "timeline",
        &[
            ("Finns det en deadline eller tidpunkt när det måste vara löst?", 2),
            ("Inom vilken tidsram behöver ni se en förändring?", 1),
        ],
    ),
    (
        "cost_of_inaction",
        &[
            ("Vad händer om ni inte gör något åt problemet det kommande året?", 2),
            ("Vilka risker ser ni med att låta det vara som det är?", 1),
        ],
    ),
    // success-check
    (
        "success_criteria",
        &[
            ("Hur ser ett lyckat resultat ut för er?", 2),
            ("Vad måste vara sant för att ni ska säga att projektet lyckats?", 1),
        ],
    ),
    (
        "measurable_kpi",
        &[
            ("Vilka nyckeltal skulle ni använda för att mäta förbättringen?", 2),
            ("Hur mycket vill ni minska eller öka något, i procent eller siffror?", 1),
        ],
    ),
    (
        "target_timeframe",
        &[
            ("När förväntar ni er att se resultat?", 2),
            ("Inom hur många månader behöver effekten synas?", 1),
        ],
    ),
    (
        "follow_up",
        &[
            ("Hur tänker ni följa upp att lösningen ger effekt?", 2),
            ("Vem ansvarar för att utvärdera resultatet?", 1),
        ],
    ),
    // resources
    (
        "budget",
        &[
            ("Finns det en budget avsatt för att lösa det här?", 2),
            ("I vilken storleksordning är ni beredda att investera?", 1),
        ],
    ),
    (
        "people",
        &[
            ("Hur många personer kan arbeta med det här och på hur stor del av sin tid?", 2),
            ("Vem skulle äga projektet internt?", 1),
        ],
    ),
    (
        "competence",
        &[
            ("Vilken kompetens har ni internt för ett sådant här projekt?", 2),
            ("Har ni erfarenhet av liknande införanden tidigare?", 1),
        ],
    ),
    (
        "time_capacity",
        &[
            ("Hur mycket tid kan teamet realistiskt lägga på detta per vecka?", 2),
            ("Finns det perioder då ni har särskilt ont om tid?", 1),
        ],
    ),
    // org-reality
    (
        "decision_maker",
        &[
            ("Vem fattar det slutliga beslutet om en investering som den här?", 2),
            ("Hur ser beslutsprocessen ut hos er?", 1),
        ],
    ),
    (
        "stakeholders",
        &[
            ("Vilka avdelningar eller personer behöver involveras?", 2),
            ("Vem behöver förankra beslutet innan ni kan gå vidare?", 1),
        ],
    ),
    (
        "change_readiness",
        &[
            ("Hur brukar förändringar tas emot i organisationen?", 2),
            ("Räknar ni med något motstånd mot en ny lösning?", 1),
        ],
    ),
    (
        "existing_systems",
        &[
            ("Vilka system och verktyg använder ni i dag för det här?", 2),
            ("Behöver en lösning integreras med ert affärssystem?", 1),
        ],
    ),
    // alternatives
    (
        "considered_options",
        &[
            ("Vilka andra lösningar har ni tittat på?", 2),
            ("Har ni jämfört olika alternativ?", 1),
        ],
    ),
    (
        "previous_attempts",
        &[
            ("Har ni försökt lösa problemet tidigare, och hur gick det?", 2),
            ("Vad har ni redan testat?", 1),
        ],
    ),
    (
        "competitors",
        &[
            ("Finns det leverantörer ni redan pratar med?", 2),
            ("Vet ni hur konkurrenter i er bransch har löst det här?", 1),
        ],
    ),
    (
        "selection_criteria",
        &[
            ("Vad är viktigast för er när ni väljer lösning?", 2),
            ("Vilka krav måste en lösning uppfylla?", 1),
        ],
    ),
];
