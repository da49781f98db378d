//! Deterministic rules mapping registry posting-type codes to income classes.
//!
//! The catalog is data: seven disjoint code lists, one per class, folded into a
//! single lookup table on first use. Lists are inserted in priority order and
//! the first insertion wins, so a code accidentally listed twice keeps the
//! higher-priority class.

use income_core::{IncomeClass, PostingType};
use std::collections::HashMap;
use std::sync::LazyLock;
use thiserror::Error;

/// A posting type outside the catalog. Never defaulted: the whole request fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown income class for posting type {posting_type}")]
pub struct ClassificationError {
    pub posting_type: PostingType,
}

const EMPLOYMENT_INCOME: &[&str] = &[
    "L_SKATTEPLIKTIG_PERSONALRABATT",
    "L_TIPS",
    "L_AKSJER_GRUNNFONDSBEVIS_TIL_UNDERKURS",
    "L_ANNET",
    "L_ARBEIDSOPPHOLD_KOST",
    "L_ARBEIDSOPPHOLD_LOSJI",
    "L_BEREGNET_SKATT",
    "L_BESØKSREISER_HJEMMET_ANNET",
    "L_BESØKSREISER_HJEMMET_KILOMETERGODTGJØRELSE_BIL",
    "L_BETALT_UTENLANDSK_SKATT",
    "L_BIL",
    "L_BOLIG",
    "L_BONUS",
    "L_BONUS_FRA_FORSVARET",
    "L_ELEKTRONISK_KOMMUNIKASJON",
    "L_FAST_BILGODTGJØRELSE",
    "L_FAST_TILLEGG",
    "L_FASTLØNN",
    "L_FERIEPENGER",
    "L_FOND_FOR_IDRETTSUTØVERE",
    "Y_FORELDREPENGER",
    "L_HELLIGDAGSTILLEGG",
    "L_HONORAR_AKKORD_PROSENT_PROVISJON",
    "L_HYRETILLEGG",
    "L_INNBETALING_TIL_UTENLANDSK_PENSJONSORDNING",
    "L_KILOMETERGODTGJØRELSE_BIL",
    "L_KOMMUNAL_OMSORGSLØNN_OG_FOSTERHJEMSGODTGJØRELSE",
    "L_KOST_DAGER",
    "L_KOST_DØGN",
    "L_KOSTBESPARELSE_I_HJEMMET",
    "L_LOSJI",
    "L_IKKE_SKATTEPLIKTIG_LØNN_FRA_UTENLANDSK_DIPLOM_KONSUL_STASJON",
    "L_LØNN_FOR_BARNEPASS_I_BARNETS_HJEM",
    "L_LØNN_TIL_PRIVATPERSONER_FOR_ARBEID_I_HJEMMET",
    "L_LØNN_UTBETALT_AV_VELDEDIG_ELLER_ALLMENNYTTIG_INSTITUSJON_ELLER_ORGANISASJON",
    "L_LØNN_TIL_VERGE_FRA_FYLKESMANNEN",
    "L_OPSJONER",
    "L_OVERTIDSGODTGJØRELSE",
    "L_REISE_ANNET",
    "L_REISE_KOST",
    "L_REISE_LOSJI",
    "L_RENTEFORDEL_LÅN",
    "L_SKATTEPLIKTIG_DEL_FORSIKRINGER",
    "L_SLUTTVEDERLAG",
    "L_SMUSSTILLEGG",
    "L_STIPEND",
    "L_STYREHONORAR_OG_GODTGJØRELSE_VERV",
    "Y_SVANGERSKAPSPENGER",
    "L_TIMELØNN",
    "L_TREKK_I_LØNN_FOR_FERIE",
    "L_UREGELMESSIGE_TILLEGG_KNYTTET_TIL_ARBEIDET_TID",
    "L_UREGELMESSIGE_TILLEGG_KNYTTET_TIL_IKKE_ARBEIDET_TID",
    "L_YRKEBIL_TJENESTLIGBEHOV_KILOMETER",
    "L_YRKEBIL_TJENESTLIGBEHOV_LISTEPRIS",
    // Seafarers' wages (hyre) count as ordinary employment income
    "L_ANNET_H",
    "L_BONUS_H",
    "L_FAST_TILLEGG_H",
    "L_FASTLØNN_H",
    "L_FERIEPENGER_H",
    "L_HELLIGDAGSTILLEGG_H",
    "L_OVERTIDSGODTGJØRELSE_H",
    "L_SLUTTVEDERLAG_H",
    "L_TIMELØNN_H",
    "L_UREGELMESSIGE_TILLEGG_KNYTTET_TIL_ARBEIDET_TID_H",
    "L_UREGELMESSIGE_TILLEGG_KNYTTET_TIL_IKKE_ARBEIDET_TID_H",
    "L_TREKK_I_LØNN_FOR_FERIE_H",
];

const CATCH_FISHING: &[&str] = &["N_LOTT_KUN_TRYGDEAVGIFT", "N_VEDERLAG"];

const UNEMPLOYMENT_BENEFIT: &[&str] = &[
    "Y_DAGPENGER_VED_ARBEIDSLØSHET",
    "Y_DAGPENGER_TIL_FISKER_SOM_BARE_HAR_HYRE",
];

const UNEMPLOYMENT_BENEFIT_CATCH_FISHING: &[&str] = &["N_DAGPENGER_TIL_FISKER"];

const SICK_PAY_CATCH_FISHING: &[&str] = &["N_SYKEPENGER_TIL_FISKER"];

const SICK_PAY: &[&str] = &["Y_SYKEPENGER", "Y_SYKEPENGER_TIL_FISKER_SOM_BARE_HAR_HYRE"];

const LABOUR_MARKET_MEASURE_PAY: &[&str] = &[
    "L_ANNET_T",
    "L_BONUS_T",
    "L_FAST_TILLEGG_T",
    "L_FASTLØNN_T",
    "L_FERIEPENGER_T",
    "L_HELLIGDAGSTILLEGG_T",
    "L_OVERTIDSGODTGJØRELSE_T",
    "L_SLUTTVEDERLAG_T",
    "L_TIMELØNN_T",
    "L_UREGELMESSIGE_TILLEGG_KNYTTET_TIL_ARBEIDET_TID_T",
    "L_UREGELMESSIGE_TILLEGG_KNYTTET_TIL_IKKE_ARBEIDET_TID_T",
    "L_TREKK_I_LØNN_FOR_FERIE_T",
];

/// Rule lists in priority order
const RULES: [(IncomeClass, &[&str]); 7] = [
    (IncomeClass::EmploymentIncome, EMPLOYMENT_INCOME),
    (IncomeClass::CatchFishing, CATCH_FISHING),
    (IncomeClass::UnemploymentBenefit, UNEMPLOYMENT_BENEFIT),
    (IncomeClass::UnemploymentBenefitCatchFishing, UNEMPLOYMENT_BENEFIT_CATCH_FISHING),
    (IncomeClass::SickPayCatchFishing, SICK_PAY_CATCH_FISHING),
    (IncomeClass::SickPay, SICK_PAY),
    (IncomeClass::LabourMarketMeasurePay, LABOUR_MARKET_MEASURE_PAY),
];

static POSTING_CLASSES: LazyLock<HashMap<&'static str, IncomeClass>> = LazyLock::new(|| {
    let mut table = HashMap::new();
    for (class, codes) in RULES {
        for code in codes {
            table.entry(*code).or_insert(class);
        }
    }
    table
});

/// Classify a single posting type.
pub fn classify(posting_type: &PostingType) -> Result<IncomeClass, ClassificationError> {
    POSTING_CLASSES
        .get(posting_type.as_str())
        .copied()
        .ok_or_else(|| ClassificationError {
            posting_type: posting_type.clone(),
        })
}

/// Every known posting type with its class, in priority order.
pub fn catalog() -> impl Iterator<Item = (PostingType, IncomeClass)> {
    RULES.into_iter().flat_map(|(class, codes)| {
        codes.iter().map(move |code| (PostingType::new(*code), class))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};

    #[test]
    fn test_every_catalog_code_classifies() {
        for (code, expected) in catalog() {
            assert_eq!(classify(&code), Ok(expected), "{code}");
        }
    }

    #[test]
    fn test_rule_lists_are_disjoint() {
        let mut seen = HashSet::new();
        for (code, _) in catalog() {
            assert!(seen.insert(code.clone()), "{code} listed in more than one class");
        }
        assert_eq!(seen.len(), POSTING_CLASSES.len());
    }

    #[test]
    fn test_every_class_has_codes() {
        let mut per_class: HashMap<IncomeClass, usize> = HashMap::new();
        for (_, class) in catalog() {
            *per_class.entry(class).or_insert(0) += 1;
        }
        for class in IncomeClass::ALL {
            assert!(per_class.get(&class).copied().unwrap_or(0) > 0, "{class:?} has no codes");
        }
    }

    #[test]
    fn test_unknown_code_is_an_error() {
        let err = classify(&PostingType::new("L_UKJENT_KODE")).unwrap_err();
        assert_eq!(err.posting_type.as_str(), "L_UKJENT_KODE");
        assert!(err.to_string().contains("L_UKJENT_KODE"));
    }

    #[test]
    fn test_lookup_is_exact() {
        // no case folding or trimming of registry codes
        assert!(classify(&PostingType::new("l_timelønn")).is_err());
        assert!(classify(&PostingType::new(" L_TIMELØNN")).is_err());
    }

    #[test]
    fn test_known_codes() {
        let cases = [
            ("L_TIMELØNN", IncomeClass::EmploymentIncome),
            ("L_FASTLØNN_H", IncomeClass::EmploymentIncome),
            ("Y_FORELDREPENGER", IncomeClass::EmploymentIncome),
            ("N_VEDERLAG", IncomeClass::CatchFishing),
            ("Y_DAGPENGER_VED_ARBEIDSLØSHET", IncomeClass::UnemploymentBenefit),
            ("Y_DAGPENGER_TIL_FISKER_SOM_BARE_HAR_HYRE", IncomeClass::UnemploymentBenefit),
            ("N_DAGPENGER_TIL_FISKER", IncomeClass::UnemploymentBenefitCatchFishing),
            ("N_SYKEPENGER_TIL_FISKER", IncomeClass::SickPayCatchFishing),
            ("Y_SYKEPENGER", IncomeClass::SickPay),
            ("Y_SYKEPENGER_TIL_FISKER_SOM_BARE_HAR_HYRE", IncomeClass::SickPay),
            ("L_BONUS_T", IncomeClass::LabourMarketMeasurePay),
        ];
        for (code, expected) in cases {
            assert_eq!(classify(&PostingType::new(code)), Ok(expected), "{code}");
        }
    }
}
