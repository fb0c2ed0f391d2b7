use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use temptree::temptree;
use vitaelib::{
    GlobalThemePaths, Palette, RenderConfig, RenderError, ResumeRenderer, Settings, Strictness,
    ThemePaths,
};

pub fn theme_paths(tree: &TempDir) -> GlobalThemePaths {
    Arc::new(ThemePaths::new(tree.path()))
}

pub fn assert_content<P, S>(path: P, content: S)
where
    P: AsRef<Path>,
    S: AsRef<str>,
{
    use std::fs;
    let actual: String = fs::read_to_string(path.as_ref())
        .unwrap_or_else(|e| format!("missing file at path '{}': {}", path.as_ref().display(), e));
    assert_eq!(actual, content.as_ref());
}

fn setup() {
    static HOOKED: once_cell::sync::OnceCell<()> = once_cell::sync::OnceCell::new();
    HOOKED.get_or_init(|| {
        let (_, eyre_hook) = color_eyre::config::HookBuilder::default().into_hooks();
        eyre_hook.install().unwrap();
    });
}

fn sample_resume() -> Value {
    json!({
        "basics": {
            "name": "Grace Hopper",
            "label": "Rear Admiral",
            "image": "",
            "url": "https://grace.example.com",
            "summary": "Wrote the *first* compiler.",
            "location": {
                "address": "1 Navy Yard",
                "city": "Arlington",
                "region": "VA",
                "postalCode": "22202",
                "countryCode": "US"
            },
            "profiles": [
                {"network": "LinkedIn", "url": "https://linkedin.com/in/grace"}
            ]
        },
        "work": [
            {"name": "US Navy", "position": "Programmer", "startDate": "1943-12-01", "endDate": "1986-8"}
        ]
    })
}

#[test]
fn sample() {
    setup();
    let template = r#"<style>{{ css | safe }}</style><h1>{{ resume.basics.name }}</h1>{% include "job.tera" %}"#;
    let job = r#"{% for job in resume.work %}<p>{{ job.position }}: {{ job.startDate | format_date }} to {{ job.endDate | format_date }}</p>{% endfor %}"#;

    let tree = temptree! {
        "resume.tera": template,
        styles: {
            "main.css": "body{background:#222831}",
        },
        views: {
            partials: {
                "job.tera": job,
            },
            components: {},
        },
        target: {},
    };

    let renderer = ResumeRenderer::new(theme_paths(&tree), RenderConfig::default());
    let html = renderer.render(&sample_resume()).unwrap();
    std::fs::write(tree.path().join("target/index.html"), html).unwrap();

    assert_content(
        tree.path().join("target/index.html"),
        "<style>body{background:#222831}</style><h1>Grace Hopper</h1><p>Programmer: 12/01/1943 to 08/1986</p>",
    );
}

#[test]
fn colors_from_settings_file() {
    setup();
    let tree = temptree! {
        "resume.tera": "{{ css | safe }}",
        "vitae.toml": "[colors]\nbackground = \"#000000\"\ncolored_accent = \"#123456\"\n",
        styles: {
            "main.css": "a{color:#FF5701}body{background:#222831;color:#FFFFFF}",
        },
    };

    let settings = Settings::from_file(&tree.path().join("vitae.toml")).unwrap();
    assert_eq!(settings.colors.highlighted_accent.as_deref(), Some("#123456"));

    let renderer = ResumeRenderer::new(theme_paths(&tree), settings.into_config());
    let html = renderer.render(&json!({})).unwrap();
    assert_eq!(html, "a{color:#123456}body{background:#000000;color:#FFFFFF}");
}

#[test]
fn markdown_only_when_enabled() {
    setup();
    let tree = temptree! {
        "resume.tera": "{{ resume.basics.summary | md_to_html }}",
        styles: {
            "main.css": "",
        },
    };
    let resume = sample_resume();

    let plain = ResumeRenderer::new(theme_paths(&tree), RenderConfig::default())
        .render(&resume)
        .unwrap();
    assert_eq!(plain, "Wrote the *first* compiler.");

    let config = RenderConfig::default().enable_markdown_support();
    let html = ResumeRenderer::new(theme_paths(&tree), config)
        .render(&resume)
        .unwrap();
    assert_eq!(html.trim(), "<p>Wrote the <em>first</em> compiler.</p>");
}

#[test]
fn empty_image_fails_render_when_processing() {
    setup();
    let tree = temptree! {
        "resume.tera": r#"<img src="{{ image_path_or_data_uri(path=resume.basics.image) }}">"#,
        styles: {
            "main.css": "",
        },
    };

    let config = RenderConfig::default().enable_image_processing();
    let err = ResumeRenderer::new(theme_paths(&tree), config)
        .render(&sample_resume())
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<RenderError>(),
        Some(RenderError::Template(_))
    ));
}

#[tokio::test]
async fn async_render_inlines_local_picture() {
    setup();
    let tree = temptree! {
        "resume.tera": r#"<img src="{{ image_path_or_data_uri(path=resume.basics.image) }}">"#,
        "me.jpg": "hi",
        styles: {
            "main.css": "",
        },
    };
    let mut resume = sample_resume();
    resume["basics"]["image"] = json!(tree.path().join("me.jpg").display().to_string());

    let config = RenderConfig::default().enable_image_processing();
    let html = ResumeRenderer::new(theme_paths(&tree), config)
        .render_async(&resume)
        .await
        .unwrap();
    assert_eq!(html, r#"<img src="data:image/jpg;base64,aGk=">"#);
}

#[test]
fn lenient_render_skips_bad_dates() {
    setup();
    let tree = temptree! {
        "resume.tera": "[{{ resume.date | format_date }}]",
        styles: {
            "main.css": "",
        },
    };
    let resume = json!({"date": "not a date"});

    let strict = ResumeRenderer::new(theme_paths(&tree), RenderConfig::default());
    assert!(strict.render(&resume).is_err());

    let config = RenderConfig::default().with_strictness(Strictness::Lenient);
    let html = ResumeRenderer::new(theme_paths(&tree), config)
        .render(&resume)
        .unwrap();
    assert_eq!(html, "[]");
}

#[test]
fn bundled_theme_renders_full_resume() {
    setup();
    let config = RenderConfig::default()
        .enable_markdown_support()
        .with_palette(Palette {
            background: Some("#101010".into()),
            ..Palette::default()
        });

    let html = ResumeRenderer::with_bundled_theme(config)
        .render(&sample_resume())
        .unwrap();

    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("<title>Grace Hopper</title>"));
    assert!(html.contains("#101010"));
    assert!(!html.contains("#222831"));
    assert!(html.contains("1 Navy Yard<br/>Arlington, VA 22202"));
    assert!(html.contains("12/01/1943 - 08/1986"));
    assert!(html.contains("<em>first</em>"));
    assert!(html.contains("grace.example.com"));
    assert!(html.contains("profile-linkedin"));
}
