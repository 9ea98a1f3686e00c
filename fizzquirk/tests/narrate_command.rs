use std::os::unix::fs::PermissionsExt;

use tempfile::tempdir;

use fizzquirk::load_config::NarratorSection;
use fizzquirk::narrate::CommandNarrator;
use fizzquirk_core::contract::Narrator;

/// Installs a fake TTS script that reads stdin and copies it to the file
/// named by `--output_file`, like piper would write audio.
fn install_fake_tts(dir: &std::path::Path) -> String {
    let script = dir.join("fake_tts.sh");
    let body = concat!(
        "#!/bin/sh\n",
        "out=\"\"\n",
        "while [ $# -gt 0 ]; do\n",
        "  if [ \"$1\" = \"--output_file\" ]; then out=\"$2\"; shift; fi\n",
        "  shift\n",
        "done\n",
        "cat > \"$out\"\n",
    );
    std::fs::write(&script, body).expect("Writing fake TTS script failed");
    let mut perms = std::fs::metadata(&script).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&script, perms).unwrap();
    script.to_string_lossy().into_owned()
}

#[tokio::test]
async fn test_narrate_writes_audio_through_the_program() {
    let dir = tempdir().unwrap();
    let narrator = CommandNarrator::new(&NarratorSection {
        program: install_fake_tts(dir.path()),
        voice: None,
    });

    let out_path = dir.path().join("narration.mp3");
    let written = narrator
        .narrate("Did you know about Test Topic?", &out_path)
        .await
        .expect("Narration should succeed");

    assert_eq!(written, out_path);
    let content = std::fs::read_to_string(&out_path).unwrap();
    assert_eq!(
        content, "Did you know about Test Topic?",
        "The narration text should reach the program on stdin"
    );
}

#[tokio::test]
async fn test_narrate_passes_voice_as_model_argument() {
    let dir = tempdir().unwrap();
    // This fake records its arguments instead of synthesizing.
    let script = dir.path().join("fake_tts.sh");
    let args_file = dir.path().join("args.txt");
    let body = format!(
        "#!/bin/sh\necho \"$@\" > {}\ncat > /dev/null\nout=\"\"\nwhile [ $# -gt 0 ]; do\n  if [ \"$1\" = \"--output_file\" ]; then out=\"$2\"; shift; fi\n  shift\ndone\ntouch \"$out\"\n",
        args_file.display()
    );
    std::fs::write(&script, body).unwrap();
    let mut perms = std::fs::metadata(&script).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&script, perms).unwrap();

    let narrator = CommandNarrator::new(&NarratorSection {
        program: script.to_string_lossy().into_owned(),
        voice: Some("en_US-amy-medium".to_string()),
    });

    let out_path = dir.path().join("narration.mp3");
    narrator
        .narrate("text", &out_path)
        .await
        .expect("Narration should succeed");

    let args = std::fs::read_to_string(&args_file).unwrap();
    assert!(
        args.contains("--model en_US-amy-medium"),
        "The voice should be passed as --model, got: {args}"
    );
}

#[tokio::test]
async fn test_narrate_fails_when_program_exits_nonzero() {
    let dir = tempdir().unwrap();
    let narrator = CommandNarrator::new(&NarratorSection {
        program: "false".to_string(),
        voice: None,
    });

    let result = narrator.narrate("text", &dir.path().join("out.mp3")).await;
    assert!(
        result.is_err(),
        "A failing TTS program must surface as a narration error"
    );
}

#[tokio::test]
async fn test_narrate_fails_when_program_writes_nothing() {
    let dir = tempdir().unwrap();
    // Exits cleanly but never writes the output file.
    let script = dir.path().join("fake_tts.sh");
    std::fs::write(&script, "#!/bin/sh\ncat > /dev/null\n").unwrap();
    let mut perms = std::fs::metadata(&script).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&script, perms).unwrap();

    let narrator = CommandNarrator::new(&NarratorSection {
        program: script.to_string_lossy().into_owned(),
        voice: None,
    });

    let result = narrator.narrate("text", &dir.path().join("out.mp3")).await;
    assert!(
        result.is_err(),
        "A clean exit without an audio file must surface as a narration error"
    );
    let message = result.unwrap_err().to_string();
    assert!(
        message.contains("was not written"),
        "The error should call out the missing file, got: {message}"
    );
}

#[tokio::test]
async fn test_narrate_fails_when_program_is_missing() {
    let dir = tempdir().unwrap();
    let narrator = CommandNarrator::new(&NarratorSection {
        program: "definitely-not-a-real-tts-binary".to_string(),
        voice: None,
    });

    let result = narrator.narrate("text", &dir.path().join("out.mp3")).await;
    assert!(result.is_err(), "A missing program must fail to spawn");
}
