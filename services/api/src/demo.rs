use crate::infra::{InMemoryAckRepository, InMemoryFileStore, StoredFile};
use chrono::DateTime;
use clap::Args;
use mod_ack::activity::{
    validate_url, AckContent, AckForm, AckModule, AckRecord, AckServiceError, AckSubmission,
    AckType, CourseId, CourseModuleId, EditorContent, FileArea, FileTransferService, KeyScheme,
    StringTable, TextFormat, UrlParameterPair,
};
use mod_ack::config::ModuleConfig;
use mod_ack::error::AppError;
use std::sync::Arc;

const DEMO_COURSE: CourseId = CourseId(2);

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Use the prefixed string and field identifiers (`ackname`, `acktypeurl`, ...)
    #[arg(long)]
    pub(crate) prefixed_keys: bool,
    /// Course upload limit in bytes applied to the file pickers
    #[arg(long)]
    pub(crate) course_maxbytes: Option<u64>,
    /// Print the stored rows as JSON instead of a summary
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct CheckUrlArgs {
    /// Values to check, as typed into the settings form
    #[arg(required = true)]
    pub(crate) urls: Vec<String>,
    /// Report messages under the prefixed string identifiers
    #[arg(long)]
    pub(crate) prefixed_keys: bool,
}

fn key_scheme(prefixed: bool) -> KeyScheme {
    if prefixed {
        KeyScheme::Prefixed
    } else {
        KeyScheme::Plain
    }
}

pub(crate) fn run_check_url(args: CheckUrlArgs) -> Result<(), AppError> {
    let strings = StringTable::new(key_scheme(args.prefixed_keys));
    for url in &args.urls {
        match validate_url(url.trim(), &strings) {
            None => println!("{url}: ok"),
            Some(message) => println!("{url}: {message}"),
        }
    }
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        prefixed_keys,
        course_maxbytes,
        json,
    } = args;

    let mut config = ModuleConfig {
        string_keys: key_scheme(prefixed_keys),
        ..ModuleConfig::default()
    };
    if let Some(maxbytes) = course_maxbytes {
        config.course_maxbytes = maxbytes;
    }

    let files = Arc::new(InMemoryFileStore::default());
    let module = AckModule::new(
        Arc::new(InMemoryAckRepository::default()),
        files.clone(),
        config,
    );

    println!("Acknowledgement activity demo");
    let form = AckForm::new(module.strings(), module.config());
    let definition = form.definition();
    println!("Settings form ({} fields):", definition.elements.len());
    for element in &definition.elements {
        println!("  - {} [{:?}] {}", element.name, element.kind, element.label);
    }

    let figure = files
        .stage_draft(vec![StoredFile::new("goggles.png", 48_213)])
        .map_err(AckServiceError::from)?;
    let handbook = files
        .stage_draft(vec![StoredFile::new("handbook.pdf", 512_000)])
        .map_err(AckServiceError::from)?;

    let submissions = vec![
        AckSubmission {
            course: DEMO_COURSE,
            coursemodule: CourseModuleId(11),
            name: "Lab safety rules".to_string(),
            kind: AckType::Text,
            typetext: Some(EditorContent {
                text: "<p>Wear goggles at all times.</p>".to_string(),
                format: TextFormat::Html,
                itemid: Some(figure),
            }),
            ..AckSubmission::default()
        },
        AckSubmission {
            course: DEMO_COURSE,
            coursemodule: CourseModuleId(12),
            name: "Employee handbook".to_string(),
            kind: AckType::File,
            typefile: Some(handbook),
            accepttext: Some("I have read the handbook".to_string()),
            ..AckSubmission::default()
        },
        AckSubmission {
            course: DEMO_COURSE,
            coursemodule: CourseModuleId(13),
            name: "Privacy notice".to_string(),
            kind: AckType::Url,
            typeurl: Some("www.example.org/privacy".to_string()),
            parameters: vec![
                UrlParameterPair::new("lang", "en"),
                UrlParameterPair::new("", "dropped"),
                UrlParameterPair::new("lang", "de"),
            ],
            ..AckSubmission::default()
        },
    ];

    println!("\nCreating instances");
    let mut created = Vec::new();
    for submission in submissions {
        let errors = form.validate(&submission);
        if !errors.is_empty() {
            println!("  - {} rejected: {:?}", submission.name, errors);
            continue;
        }
        let id = module.add_instance(submission)?;
        if let Some(record) = module.get_instance(id)? {
            render_record(&record, json);
        }
        created.push(id);
    }

    let text_context = files
        .module_context(CourseModuleId(11))
        .map_err(AckServiceError::from)?;
    let text_area = FileArea::new(text_context, module.config().text_file_area.clone());
    let embedded = files.area_files(&text_area).map_err(AckServiceError::from)?;
    println!(
        "  Embedded files in '{}': {}",
        text_area.area,
        embedded
            .iter()
            .map(|file| format!("{} ({})", file.filename, file.mime))
            .collect::<Vec<_>>()
            .join(", ")
    );

    if let Some(&first) = created.first() {
        println!("\nEditing instance {first}");
        if let Some(mut edit) = module.prepare_edit_submission(first)? {
            edit.name = "Lab safety rules (revised)".to_string();
            let updated = module.update_instance(edit)?;
            println!("  - updated: {updated}");
            if let Some(record) = module.get_instance(first)? {
                render_record(&record, json);
            }
        }
    }

    println!("\nRejected upload");
    let installer = files
        .stage_draft(vec![StoredFile::new("setup.exe", 1_024)])
        .map_err(AckServiceError::from)?;
    let rejected = AckSubmission {
        course: DEMO_COURSE,
        coursemodule: CourseModuleId(14),
        name: "Installer".to_string(),
        kind: AckType::File,
        typefile: Some(installer),
        ..AckSubmission::default()
    };
    match module.add_instance(rejected) {
        Ok(id) => println!("  - unexpectedly stored as {id}"),
        Err(err) => println!("  - {err}"),
    }

    if let Some(&last) = created.last() {
        println!("\nDeleting instance {last}");
        println!("  - first delete: {}", module.delete_instance(last)?);
        println!("  - second delete: {}", module.delete_instance(last)?);
    }

    Ok(())
}

fn render_record(record: &AckRecord, json: bool) {
    if json {
        match serde_json::to_string(record) {
            Ok(row) => println!("  {row}"),
            Err(err) => println!("  (row not serializable: {err})"),
        }
        return;
    }

    let id = record
        .id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "-".to_string());
    println!(
        "  - #{} {} [{}] created {} modified {}",
        id,
        record.name,
        record.kind().label(),
        format_timestamp(record.timecreated),
        format_timestamp(record.timemodified),
    );
    match &record.content {
        AckContent::Text { content, format } => {
            println!("    text ({format:?}): {content}")
        }
        AckContent::File => println!("    file attachment"),
        AckContent::Url {
            externalurl,
            parameters,
        } => {
            let pairs = parameters
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("&");
            println!("    url: {externalurl} params: {pairs}");
        }
    }
    println!("    accept: {}", record.accepttext);
}

fn format_timestamp(seconds: i64) -> String {
    if seconds == 0 {
        return "never".to_string();
    }
    DateTime::from_timestamp(seconds, 0)
        .map(|moment| moment.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| seconds.to_string())
}
