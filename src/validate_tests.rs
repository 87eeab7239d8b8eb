use super::*;

fn request(name: &str, os: &str, cpu: &str, ram: &str) -> MachineRequest {
    MachineRequest {
        name: name.to_string(),
        os: os.to_string(),
        cpu: cpu.to_string(),
        ram: ram.to_string(),
    }
}

#[test]
fn digits_only_names_are_rejected() {
    for name in ["0", "1", "123", "007", "9876543210"] {
        assert!(!validate_name(name), "{name:?} should be rejected");
        assert_eq!(check_name(name), Err(RejectReason::DigitsOnly));
    }
}

#[test]
fn names_matching_the_pattern_are_accepted() {
    for name in ["a", "web01", "Web-01", "db_primary", "x-y_z-9", "Z", "aB3_-"] {
        assert!(validate_name(name), "{name:?} should be accepted");
    }
}

#[test]
fn names_outside_the_pattern_are_rejected() {
    for name in [
        "1web", "-web", "_web", "web 01", "web.01", "web/01", "wéb", "web01!", "9-a",
    ] {
        assert!(!validate_name(name), "{name:?} should be rejected");
    }
    assert_eq!(check_name("1web"), Err(RejectReason::InvalidNameFormat));
}

#[test]
fn blank_names_are_rejected_as_empty() {
    for name in ["", " ", "\t\n"] {
        assert_eq!(check_name(name), Err(RejectReason::Empty));
        assert!(!validate_name(name));
    }
}

#[test]
fn surrounding_whitespace_is_ignored_for_names() {
    assert!(validate_name("  web01 \n"));
}

#[test]
fn os_membership_ignores_case() {
    for os in ["Ubuntu", "CENTOS", "windows", "  ubuntu  "] {
        assert!(validate_os(os), "{os:?} should be accepted");
    }
}

#[test]
fn unknown_os_is_rejected() {
    for os in ["debian", "solaris", "", "ubuntu22", "win"] {
        assert!(!validate_os(os), "{os:?} should be rejected");
        assert_eq!(check_os(os), Err(RejectReason::UnsupportedOs));
    }
}

#[test]
fn positive_numbers_are_accepted() {
    for raw in ["4", "0.5", "16", " 2 ", "1e3", "+3"] {
        assert!(
            validate_numeric_positive(Field::Cpu, raw),
            "{raw:?} should be accepted"
        );
    }
    assert_eq!(parse_positive("0.5"), Ok(0.5));
}

#[test]
fn zero_negative_and_non_numeric_values_are_rejected() {
    assert_eq!(parse_positive("0"), Err(RejectReason::NotPositive));
    assert_eq!(parse_positive("-5"), Err(RejectReason::NotPositive));
    assert_eq!(parse_positive("-0"), Err(RejectReason::NotPositive));
    assert_eq!(parse_positive("abc"), Err(RejectReason::NotANumber));
    assert_eq!(parse_positive(""), Err(RejectReason::NotANumber));
    for raw in ["0", "-5", "abc"] {
        assert!(!validate_numeric_positive(Field::Ram, raw));
    }
}

#[test]
fn non_finite_values_are_rejected() {
    for raw in ["inf", "NaN", "infinity"] {
        assert_eq!(parse_positive(raw), Err(RejectReason::NotFinite));
    }
}

#[test]
fn check_request_returns_trimmed_fields_when_valid() {
    let raw = request(" web01 ", "Ubuntu ", "4", "16");
    let fields = check_request(&raw).expect("request should validate");
    assert_eq!(fields.name, "web01");
    assert_eq!(fields.os, "Ubuntu");
    assert_eq!(fields.cpu, 4.0);
    assert_eq!(fields.ram, 16.0);
}

#[test]
fn check_request_reports_every_failing_field() {
    let raw = request("123", "solaris", "0", "abc");
    let rejections = check_request(&raw).expect_err("request should be rejected");
    let fields: Vec<Field> = rejections.iter().map(|r| r.field).collect();
    assert_eq!(fields, vec![Field::Name, Field::Os, Field::Cpu, Field::Ram]);
    assert_eq!(rejections[0].raw, "123");
    assert_eq!(rejections[2].reason, RejectReason::NotPositive);
}

#[test]
fn check_request_rejects_a_single_bad_field() {
    let raw = request("db1", "solaris", "2", "8");
    let rejections = check_request(&raw).expect_err("unsupported OS");
    assert_eq!(rejections.len(), 1);
    assert_eq!(rejections[0].field, Field::Os);
    assert_eq!(rejections[0].reason, RejectReason::UnsupportedOs);
}

#[test]
fn rejection_display_names_field_value_and_reason() {
    let rejection = FieldRejection {
        field: Field::Cpu,
        raw: "-5".to_string(),
        reason: RejectReason::NotPositive,
    };
    assert_eq!(
        rejection.to_string(),
        "cpu \"-5\": value must be greater than zero"
    );
}
