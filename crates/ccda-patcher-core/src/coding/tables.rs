//! Intake vocabulary tables.

use super::{CodeMapping, ADMINISTRATIVE_GENDER, SNOMED_CT};

const GAY_OR_LESBIAN: (&str, &str) = ("Gay or lesbian", "38628009");
const STRAIGHT: (&str, &str) = ("Straight (not gay or lesbian)", "20430005");
const OTHER: (&str, &str) = ("other", "OTH");
const UNKNOWN: (&str, &str) = ("unknown", "UKN");

/// Sexual orientation, LOINC answer list LL3323-4.
pub static SEXUAL_ORIENTATION: CodeMapping = CodeMapping {
    name: "sexual_orientation",
    code_system: SNOMED_CT,
    entries: &[
        ("Lesbian/Dyke/Gay Female", GAY_OR_LESBIAN.0, GAY_OR_LESBIAN.1),
        ("Straight/Heterosexual", STRAIGHT.0, STRAIGHT.1),
        // Bound to the heterosexual concept in the clinic's intake mapping
        ("Bisexual", "Bisexual", "20430005"),
        ("Other - unspecified", OTHER.0, OTHER.1),
        ("Gay Male", GAY_OR_LESBIAN.0, GAY_OR_LESBIAN.1),
        ("Queer", OTHER.0, OTHER.1),
        ("Do Not Know", UNKNOWN.0, UNKNOWN.1),
        ("Other (specify)", OTHER.0, OTHER.1),
        ("Refused", UNKNOWN.0, UNKNOWN.1),
        ("Questioning", OTHER.0, OTHER.1),
        ("Trans", UNKNOWN.0, UNKNOWN.1),
        ("Same-Gender Loving", GAY_OR_LESBIAN.0, GAY_OR_LESBIAN.1),
        ("Declined to state", UNKNOWN.0, UNKNOWN.1),
        ("do not identify", UNKNOWN.0, UNKNOWN.1),
        ("Hetero", STRAIGHT.0, STRAIGHT.1),
        ("NULL", UNKNOWN.0, UNKNOWN.1),
        ("Heterosexual", STRAIGHT.0, STRAIGHT.1),
        ("Gay", GAY_OR_LESBIAN.0, GAY_OR_LESBIAN.1),
        ("Pansexual", OTHER.0, OTHER.1),
        ("Lesbian", GAY_OR_LESBIAN.0, GAY_OR_LESBIAN.1),
    ],
};

const IDENTIFIES_MALE: (&str, &str) = ("Identifies as male gender (finding)", "446151000124109");
const IDENTIFIES_FEMALE: (&str, &str) = ("Identifies as female gender (finding)", "446141000124107");
const FTM: (&str, &str) = ("Female-to-male transsexual (finding)", "407377005");
const MTF: (&str, &str) = ("Male-to-female transsexual (finding)", "407376001");
const NON_CONFORMING: (&str, &str) = ("Identifies as non-conforming gender (finding)", "446131000124102");

/// Gender identity, PHIN VS gender identity value set.
///
/// The intake answer keys are provisional: the clinic has not supplied a gender identity
/// binding, so these await confirmation from a domain owner before use in production.
pub static GENDER_IDENTITY: CodeMapping = CodeMapping {
    name: "gender_identity",
    code_system: SNOMED_CT,
    entries: &[
        ("Male", IDENTIFIES_MALE.0, IDENTIFIES_MALE.1),
        ("Identifies as Male", IDENTIFIES_MALE.0, IDENTIFIES_MALE.1),
        ("Female", IDENTIFIES_FEMALE.0, IDENTIFIES_FEMALE.1),
        ("Identifies as Female", IDENTIFIES_FEMALE.0, IDENTIFIES_FEMALE.1),
        ("Trans Male/Transgender Man", FTM.0, FTM.1),
        ("Female-to-Male (FTM)/Transgender Male/Trans Man", FTM.0, FTM.1),
        ("Trans Female/Transgender Woman", MTF.0, MTF.1),
        ("Male-to-Female (MTF)/Transgender Female/Trans Woman", MTF.0, MTF.1),
        ("Genderqueer", NON_CONFORMING.0, NON_CONFORMING.1),
        ("Non-binary", NON_CONFORMING.0, NON_CONFORMING.1),
        ("Other (specify)", OTHER.0, OTHER.1),
        ("Other - unspecified", OTHER.0, OTHER.1),
        ("Declined to state", UNKNOWN.0, UNKNOWN.1),
        ("Refused", UNKNOWN.0, UNKNOWN.1),
        ("Do Not Know", UNKNOWN.0, UNKNOWN.1),
    ],
};

/// Sex assigned at birth, from the administrative sex recorded in demographics.
pub static BIRTH_SEX: CodeMapping = CodeMapping {
    name: "birth_sex",
    code_system: ADMINISTRATIVE_GENDER,
    entries: &[
        ("F", "Female", "F"),
        ("Female", "Female", "F"),
        ("M", "Male", "M"),
        ("Male", "Male", "M"),
    ],
};
