//! Built-in rubric: four information points for each of the six clusters.

use super::{PointSpec, RequirementSpec};
use crate::cluster::ClusterId;

/// Static definition of one information point.
pub(super) struct PointDef {
    pub key: &'static str,
    pub description: &'static str,
    pub keywords: &'static [&'static str],
    pub patterns: &'static [&'static str],
    pub weight: u8,
}

/// Static definition of one cluster's rubric.
pub(super) struct ClusterDef {
    pub name: &'static str,
    pub description: &'static str,
    pub minimum_points: usize,
    pub progress_threshold: u8,
    pub points: &'static [PointDef],
}

impl ClusterDef {
    pub(super) fn to_spec(&self) -> RequirementSpec {
        RequirementSpec {
            name: self.name.to_string(),
            description: self.description.to_string(),
            minimum_points: self.minimum_points,
            progress_threshold: self.progress_threshold,
            points: self
                .points
                .iter()
                .map(|p| PointSpec {
                    key: p.key.to_string(),
                    description: p.description.to_string(),
                    keywords: p.keywords.iter().map(|k| k.to_string()).collect(),
                    patterns: p.patterns.iter().map(|k| k.to_string()).collect(),
                    weight: p.weight,
                    questions: Vec::new(),
                })
                .collect(),
        }
    }
}

pub(super) fn definition(id: ClusterId) -> &'static ClusterDef {
    match id {
        ClusterId::PainPoint => &PAIN_POINT,
        ClusterId::ImpactUrgency => &IMPACT_URGENCY,
        ClusterId::SuccessCheck => &SUCCESS_CHECK,
        ClusterId::Resources => &RESOURCES,
        ClusterId::OrgReality => &ORG_REALITY,
        ClusterId::Alternatives => &ALTERNATIVES,
    }
}

static PAIN_POINT: ClusterDef = ClusterDef {
    name: "Smärtpunkt",
    description: "Vilket problem kunden vill lösa, vad det kostar och vem som drabbas",
    minimum_points: 3,
    progress_threshold: 75,
    points: &[
        PointDef {
            key: "problem_description",
            description: "Beskrivning av huvudproblemet",
            keywords: &[
                "problem",
                "utmaning",
                "svårt",
                "krångl",
                "manuell",
                "manuella",
                "ineffektiv",
                "tidskrävande",
            ],
            patterns: &[
                r"(?i)\b(problem|utmaning|svårighet)\w*\s+med\b",
                r"(?i)\bmanuell\w*\s+\w+",
            ],
            weight: 4,
        },
        PointDef {
            key: "cost_impact",
            description: "Kostnad eller ekonomisk påverkan av problemet",
            keywords: &[
                "kostar",
                "kostnad",
                "kronor",
                "pengar",
                "förlust",
                "timmar",
            ],
            patterns: &[
                r"(?i)\d[\d\s]*\s*(kr|kronor|sek|tkr|mkr)\b",
                r"(?i)\b\d+\s*(timmar|h)\b",
            ],
            weight: 3,
        },
        PointDef {
            key: "frequency",
            description: "Hur ofta problemet uppstår",
            keywords: &[
                "varje",
                "dagligen",
                "veckan",
                "månad",
                "ofta",
                "alltid",
                "hela tiden",
            ],
            patterns: &[
                r"(?i)\b(varje|per|i)\s+(dag|vecka|veckan|månad|år)\w*",
                r"(?i)\b(dagligen|veckovis|månadsvis|ständigt)\b",
            ],
            weight: 2,
        },
        PointDef {
            key: "affected_parties",
            description: "Vilka personer eller avdelningar som påverkas",
            keywords: &[
                "team",
                "avdelning",
                "medarbetare",
                "personal",
                "kunder",
                "drabbas",
                "påverkas",
                "ekonomi",
            ],
            patterns: &[
                r"(?i)\b\w*(team|avdelning)\w*\b",
                r"(?i)\b(drabbas|påverkas|lider)\b",
            ],
            weight: 3,
        },
    ],
};

static IMPACT_URGENCY: ClusterDef = ClusterDef {
    name: "Påverkan och brådska",
    description: "Hur problemet påverkar verksamheten och hur snabbt det måste lösas",
    minimum_points: 3,
    progress_threshold: 75,
    points: &[
        PointDef {
            key: "business_impact",
            description: "Hur problemet påverkar verksamheten",
            keywords: &[
                "påverkar",
                "påverkan",
                "konsekvens",
                "förlorar",
                "tappar",
                "missar",
                "intäkter",
            ],
            patterns: &[
                r"(?i)\b(påverka[rs]?|påverkan)\b",
                r"(?i)\b(förlora[rt]?|tappa[rt]?|missa[rt]?)\s+\w+",
            ],
            weight: 4,
        },
        PointDef {
            key: "urgency_level",
            description: "Hur brådskande det är att lösa problemet",
            keywords: &[
                "bråttom",
                "akut",
                "brådskande",
                "snabbt",
                "omgående",
                "prioritet",
                "viktigt",
            ],
            patterns: &[
                r"(?i)\b(mycket|väldigt|extremt|ganska)\s+(bråttom|viktigt|akut|brådskande)\b",
                r"(?i)\b(högsta|hög)\s+prioritet\b",
            ],
            weight: 3,
        },
        PointDef {
            key: "timeline",
            description: "Tidsram eller deadline för en lösning",
            keywords: &["deadline", "senast", "innan", "kvartal", "sommaren", "årsskiftet"],
            patterns: &[
                r"(?i)\b(inom|innan|senast|före)\s+\w+",
                r"(?i)\b(q[1-4]|20\d{2})\b",
            ],
            weight: 2,
        },
        PointDef {
            key: "cost_of_inaction",
            description: "Vad det kostar att inte agera",
            keywords: &["om vi inte", "fortsätter", "riskerar", "risk", "värre", "växer"],
            patterns: &[
                r"(?i)\bom\s+(vi|ni)\s+inte\b",
                r"(?i)\brisker(ar|a)\b",
            ],
            weight: 3,
        },
    ],
};

static SUCCESS_CHECK: ClusterDef = ClusterDef {
    name: "Framgångskriterier",
    description: "Hur kunden kommer att avgöra att lösningen fungerar",
    minimum_points: 3,
    progress_threshold: 75,
    points: &[
        PointDef {
            key: "success_criteria",
            description: "Vad som definierar framgång",
            keywords: &["framgång", "lyckat", "lyckas", "målet", "uppnå", "nöjda"],
            patterns: &[
                r"(?i)\b(lyckat|lyckas|framgång\w*)\b",
                r"(?i)\bmål(et|en)?\s+är\b",
            ],
            weight: 4,
        },
        PointDef {
            key: "measurable_kpi",
            description: "Mätbara nyckeltal",
            keywords: &["kpi", "nyckeltal", "procent", "mäta", "mätbar", "minska", "öka"],
            patterns: &[
                r"(?i)\d+\s*(%|procent)",
                r"(?i)\b(minska|öka|halvera|dubbla|sänka)\w*\b",
            ],
            weight: 3,
        },
        PointDef {
            key: "target_timeframe",
            description: "När resultatet ska synas",
            keywords: &["inom", "månader", "kvartal", "sikt", "första året"],
            patterns: &[
                r"(?i)\binom\s+(\d+|ett|en|två|tre|sex)\s+(dagar|veckor|månader|år)\b",
                r"(?i)\bpå\s+(kort|lång|sikt)\b",
            ],
            weight: 2,
        },
        PointDef {
            key: "follow_up",
            description: "Hur uppföljning ska ske",
            keywords: &["uppföljning", "följa upp", "rapport", "utvärdera", "dashboard", "mäter"],
            patterns: &[r"(?i)\bfölja\s+upp\b", r"(?i)\butvärder\w*\b"],
            weight: 2,
        },
    ],
};

static RESOURCES: ClusterDef = ClusterDef {
    name: "Resurser",
    description: "Budget, personer, kompetens och tid som kan avsättas",
    minimum_points: 3,
    progress_threshold: 75,
    points: &[
        PointDef {
            key: "budget",
            description: "Tillgänglig budget",
            keywords: &["budget", "kronor", "investera", "pengar", "avsätta"],
            patterns: &[
                r"(?i)\d[\d\s]*\s*(kr|kronor|sek|tkr|mkr|miljoner)\b",
                r"(?i)\bbudget\w*\b",
            ],
            weight: 4,
        },
        PointDef {
            key: "people",
            description: "Personer som kan arbeta med lösningen",
            keywords: &[
                "personer",
                "medarbetare",
                "utvecklare",
                "projektledare",
                "heltid",
                "deltid",
            ],
            patterns: &[
                r"(?i)\b(\d+|en|två|tre|fyra|fem)\s+(personer|medarbetare|utvecklare|konsulter)\b",
                r"(?i)\b(hel|del)tid\b",
            ],
            weight: 3,
        },
        PointDef {
            key: "competence",
            description: "Intern kompetens och erfarenhet",
            keywords: &["kompetens", "kunskap", "erfarenhet", "expertis", "it-avdelning"],
            patterns: &[
                r"(?i)\bkompeten\w*\b",
                r"(?i)\b(erfarenhet|kunskap)\w*\s+(av|om|inom)\b",
            ],
            weight: 2,
        },
        PointDef {
            key: "time_capacity",
            description: "Tid och kapacitet att genomföra förändringen",
            keywords: &["kapacitet", "timmar", "ont om tid", "upptagna", "tid över"],
            patterns: &[
                r"(?i)\b\d+\s*(timmar|h)\s+(i|per)\s+(vecka|veckan|månad)\b",
                r"(?i)\b(ont\s+om|brist\s+på)\s+(tid|folk|resurser)\b",
            ],
            weight: 2,
        },
    ],
};

static ORG_REALITY: ClusterDef = ClusterDef {
    name: "Organisationen",
    description: "Beslutsvägar, intressenter och befintliga system i organisationen",
    minimum_points: 2,
    progress_threshold: 50,
    points: &[
        PointDef {
            key: "decision_maker",
            description: "Vem som fattar beslutet",
            keywords: &["beslut", "ledning", "styrelse", "chef", "godkänna", "vd:n"],
            patterns: &[
                r"(?i)\b(vd|ceo|cfo|cto|ekonomichef|it-chef)\b",
                r"(?i)\b(fattar|tar)\s+(beslut\w*|besluten)\b",
            ],
            weight: 4,
        },
        PointDef {
            key: "stakeholders",
            description: "Berörda intressenter som behöver involveras",
            keywords: &["intressent", "involvera", "förankr", "berörda", "samarbete"],
            patterns: &[
                r"(?i)\b(involvera|förankra)\w*\b",
                r"(?i)\b\w+avdelning\w*\b",
            ],
            weight: 3,
        },
        PointDef {
            key: "change_readiness",
            description: "Organisationens beredskap för förändring",
            keywords: &["förändring", "motstånd", "skeptisk", "kultur", "vana", "ovilja"],
            patterns: &[
                r"(?i)\bförändring\w*\b",
                r"(?i)\b(motstånd|skeptiska?|positiva?)\b",
            ],
            weight: 2,
        },
        PointDef {
            key: "existing_systems",
            description: "Befintliga system och processer",
            keywords: &["system", "affärssystem", "erp", "excel", "verktyg", "process"],
            patterns: &[
                r"(?i)\b(använder|kör)\s+(vi\s+)?\w+",
                r"(?i)\b(erp|crm|excel|fortnox|visma|sap)\b",
            ],
            weight: 3,
        },
    ],
};

static ALTERNATIVES: ClusterDef = ClusterDef {
    name: "Alternativ",
    description: "Andra lösningar som övervägts, testats eller konkurrerar",
    minimum_points: 2,
    progress_threshold: 50,
    points: &[
        PointDef {
            key: "considered_options",
            description: "Alternativ som övervägts",
            keywords: &["alternativ", "övervägt", "tittat på", "jämfört", "andra lösningar"],
            patterns: &[r"(?i)\b(tittat|kollat)\s+på\b", r"(?i)\balternativ\w*\b"],
            weight: 3,
        },
        PointDef {
            key: "previous_attempts",
            description: "Tidigare försök att lösa problemet",
            keywords: &["testat", "provat", "försökt", "tidigare", "förut"],
            patterns: &[r"(?i)\b(testat|provat|försökt)\b", r"(?i)\btidigare\s+\w+"],
            weight: 3,
        },
        PointDef {
            key: "competitors",
            description: "Leverantörer eller konkurrerande lösningar",
            keywords: &["leverantör", "konkurrent", "byrå", "konsult", "produkt"],
            patterns: &[r"(?i)\bleverantör\w*\b", r"(?i)\bkonkurrent\w*\b"],
            weight: 2,
        },
        PointDef {
            key: "selection_criteria",
            description: "Vad som avgör valet av lösning",
            keywords: &["pris", "viktigast", "krav", "avgörande", "kriterier"],
            patterns: &[r"(?i)\b(viktigast|avgörande)\b", r"(?i)\bkrav\w*\b"],
            weight: 2,
        },
    ],
};
