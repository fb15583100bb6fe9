use crate::models::resume::{Experience, Skills};
use crate::services::anonymizer_service::AnonymizationResult;

/// Anonymization output reshaped into the columns a resume row stores.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssembledResume {
    pub anonymized_text: String,
    pub skills: Skills,
    pub experience: Experience,
}

pub fn assemble(result: AnonymizationResult) -> AssembledResume {
    AssembledResume {
        anonymized_text: result.anonymized_resume,
        skills: Skills {
            technical: result.technical_skills,
            soft: result.soft_skills,
        },
        experience: Experience {
            years: result.years_experience,
            job_titles: result.job_titles,
            key_achievements: result.key_achievements,
        },
    }
}
