use tera::Tera;

const TEMPLATES: [(&str, &str); 3] = [
    ("navbar.html", include_str!("../templates/navbar.html")),
    ("sidebar.html", include_str!("../templates/sidebar.html")),
    ("submissions.html", include_str!("../templates/submissions.html")),
];

/// Builds the template set embedded in the binary.
pub fn build_tera() -> Result<Tera, tera::Error> {
    let mut tera = Tera::default();
    tera.add_raw_templates(TEMPLATES)?;
    Ok(tera)
}
