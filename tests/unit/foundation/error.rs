use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        CadenzaError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        CadenzaError::session("x")
            .to_string()
            .contains("session error:")
    );
    assert!(
        CadenzaError::document("x")
            .to_string()
            .contains("document error:")
    );
    assert!(
        CadenzaError::render("x")
            .to_string()
            .contains("render output error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = CadenzaError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
