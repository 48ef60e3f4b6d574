use endolog::cli::NamingArgs;
use endolog::naming::{full_path, NamingField, NamingFields};
use proptest::prelude::*;
use std::path::{Path, PathBuf};

fn fields_from(values: &[String; 6]) -> NamingFields {
    let mut fields = NamingFields::default();
    for (field, value) in NamingField::ALL.iter().zip(values) {
        fields.set(*field, value.clone());
    }
    fields
}

proptest! {
    #[test]
    fn test_compose_is_concatenation(values in prop::array::uniform6("[A-Za-z0-9 _-]{0,8}")) {
        let fields = fields_from(&values);
        let expected = format!("{}.csv", values.concat());
        prop_assert_eq!(fields.compose(), expected);
    }

    #[test]
    fn test_compose_ends_with_extension(values in prop::array::uniform6("\\PC{0,6}")) {
        let name = fields_from(&values).compose();
        prop_assert!(name.ends_with(".csv"));
        prop_assert!(name.len() >= 4);
    }

    #[test]
    fn test_full_path_keeps_filename(
        folder in "[a-z]{1,8}(/[a-z]{1,8}){0,3}",
        stem in "[A-Z0-9]{1,12}"
    ) {
        let filename = format!("{stem}.csv");
        let path = full_path(Path::new(&folder), &filename);
        prop_assert_eq!(path.parent().unwrap(), Path::new(&folder));
        prop_assert_eq!(path.file_name().unwrap().to_str().unwrap(), filename.as_str());
    }
}

#[test]
fn test_default_filename() {
    assert_eq!(NamingFields::default().compose(), "CRB1Y1E01S1T1.csv");
}

#[test]
fn test_all_empty_fields() {
    let empty: [String; 6] = Default::default();
    assert_eq!(fields_from(&empty).compose(), ".csv");
}

#[test]
fn test_spaces_are_kept() {
    let mut fields = NamingFields::default();
    fields.set(NamingField::ExperimentType, "C R");
    assert_eq!(fields.compose(), "C RB1Y1E01S1T1.csv");
}

#[test]
fn test_naming_args_override_subset() {
    let args = NamingArgs {
        experiment_type: Some("XR".to_string()),
        subject: Some("S22".to_string()),
        folder: Some(PathBuf::from("out")),
        ..NamingArgs::default()
    };
    let mut fields = NamingFields::default();
    args.apply_to(&mut fields);
    assert_eq!(fields.compose(), "XRB1Y1E01S22T1.csv");
    assert_eq!(
        full_path(args.folder.as_deref().unwrap(), &fields.compose()),
        PathBuf::from("out").join("XRB1Y1E01S22T1.csv")
    );
}

#[test]
fn test_labels_and_hints() {
    for field in NamingField::ALL {
        assert!(!field.label().is_empty());
        assert!(!field.hint().is_empty());
    }
    assert_eq!(NamingField::Experience.label(), "Experience");
}
