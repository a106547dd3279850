use crate::auth::FarmType;

/// Single yes/no biosecurity question. Catalogs are fixed at deploy time
/// and never user-editable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Question {
    pub id: &'static str,
    pub prompt: &'static str,
}

/// Ordered, farm-type-specific question list used for one assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Catalog {
    pub farm_type: FarmType,
    pub questions: &'static [Question],
}

impl Catalog {
    /// Catalog for the given farm type. `Both` is a profile attribute, not
    /// a catalog key, so it has no catalog.
    pub fn for_farm_type(farm_type: FarmType) -> Option<&'static Catalog> {
        match farm_type {
            FarmType::Pig => Some(&PIG_CATALOG),
            FarmType::Poultry => Some(&POULTRY_CATALOG),
            FarmType::Both => None,
        }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn contains(&self, question_id: &str) -> bool {
        self.questions.iter().any(|q| q.id == question_id)
    }
}

pub static PIG_CATALOG: Catalog = Catalog {
    farm_type: FarmType::Pig,
    questions: &[
        Question {
            id: "biosecurity_protocol",
            prompt: "Do you have written biosecurity protocols?",
        },
        Question {
            id: "visitor_log",
            prompt: "Do you maintain a visitor log and restrict access?",
        },
        Question {
            id: "footbath",
            prompt: "Are footbaths with disinfectant available at entry points?",
        },
        Question {
            id: "quarantine",
            prompt: "Do you quarantine new animals before introducing them?",
        },
        Question {
            id: "pest_control",
            prompt: "Is there an active pest control program?",
        },
        Question {
            id: "water_quality",
            prompt: "Is drinking water regularly tested for quality?",
        },
        Question {
            id: "vaccination",
            prompt: "Are animals vaccinated according to schedule?",
        },
        Question {
            id: "disposal",
            prompt: "Are dead animals properly disposed of?",
        },
        Question {
            id: "equipment",
            prompt: "Is equipment regularly cleaned and disinfected?",
        },
        Question {
            id: "training",
            prompt: "Have staff received biosecurity training?",
        },
    ],
};

pub static POULTRY_CATALOG: Catalog = Catalog {
    farm_type: FarmType::Poultry,
    questions: &[
        Question {
            id: "biosecurity_protocol",
            prompt: "Do you have written biosecurity protocols?",
        },
        Question {
            id: "visitor_control",
            prompt: "Is visitor access controlled and recorded?",
        },
        Question {
            id: "disinfection",
            prompt: "Are vehicles disinfected before entering the farm?",
        },
        Question {
            id: "all_in_out",
            prompt: "Do you follow all-in/all-out production system?",
        },
        Question {
            id: "wild_birds",
            prompt: "Are measures in place to prevent wild bird contact?",
        },
        Question {
            id: "feed_storage",
            prompt: "Is feed stored properly to prevent contamination?",
        },
        Question {
            id: "vaccination",
            prompt: "Are birds vaccinated as per recommended schedule?",
        },
        Question {
            id: "mortality",
            prompt: "Do you monitor and record daily mortality?",
        },
        Question {
            id: "litter_management",
            prompt: "Is litter managed and disposed of properly?",
        },
        Question {
            id: "staff_training",
            prompt: "Have workers been trained in disease prevention?",
        },
    ],
};
