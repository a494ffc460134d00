//! Debug-prompt rendering (§4.7), grounded on
//! `ochiai_localizer.py::generate_debug_prompt`.

use std::collections::HashMap;

use crate::ochiai::SuspiciousLine;

pub fn generate_debug_prompt(
    suspicious_lines: &[SuspiciousLine],
    source_snippets: Option<&HashMap<(String, u32), String>>,
) -> String {
    if suspicious_lines.is_empty() {
        return "No suspicious lines identified.".to_string();
    }

    let mut prompt = String::from("Automated Fault Localization Results\n\n");
    prompt.push_str(
        "The tests failed. The Ochiai algorithm identified the following lines as most suspicious:\n\n",
    );

    for (i, line) in suspicious_lines.iter().enumerate() {
        let file_name = line.file.rsplit('/').next().unwrap_or(&line.file);
        prompt.push_str(&format!("{}. {}:L{} (Suspiciousness: {:.2})\n", i + 1, file_name, line.line, line.score));

        if let Some(snippets) = source_snippets {
            if let Some(snippet) = snippets.get(&(line.file.clone(), line.line)) {
                prompt.push_str(&format!("   ```\n   {}\n   ```\n", snippet));
            }
        }
    }

    prompt.push_str("\nAction Required:\n");
    prompt.push_str("Analyze these high-suspicion lines first. The bug is likely in one of these locations.\n");
    prompt
}
