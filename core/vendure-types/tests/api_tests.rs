use pretty_assertions::assert_eq;
use vendure_types::{ApiType, Error};

#[test]
fn api_type_parses_case_insensitively() {
    assert_eq!("admin".parse::<ApiType>().unwrap(), ApiType::Admin);
    assert_eq!("Shop".parse::<ApiType>().unwrap(), ApiType::Shop);
    assert_eq!(" ADMIN ".parse::<ApiType>().unwrap(), ApiType::Admin);
}

#[test]
fn api_type_rejects_unknown() {
    let err = "storefront".parse::<ApiType>().unwrap_err();
    assert!(matches!(err, Error::InvalidApiType(ref s) if s == "storefront"));
}

#[test]
fn api_type_display_matches_serde() {
    for api in ApiType::ALL {
        let json = serde_json::to_string(&api).unwrap();
        assert_eq!(json, format!("\"{api}\""));
    }
}

#[test]
fn api_type_all_is_admin_then_shop() {
    assert_eq!(ApiType::ALL, [ApiType::Admin, ApiType::Shop]);
}
