use crate::script::model::{Scene, Script};

/// Longest narration chunk, in characters, before a new cue is started.
pub const MAX_CHUNK_CHARS: usize = 30;
/// Upper bound of the title slot that precedes narration cues.
pub const TITLE_SLOT_MS: u64 = 1000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CueKind {
    Title,
    Narration,
}

/// One time-bounded caption. Times are absolute milliseconds from the start of the script.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionCue {
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: String,
    pub kind: CueKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SubtitleOptions {
    pub max_chunk_chars: usize,
    pub include_titles: bool,
    pub title_slot_ms: u64,
}

impl Default for SubtitleOptions {
    fn default() -> Self {
        Self {
            max_chunk_chars: MAX_CHUNK_CHARS,
            include_titles: true,
            title_slot_ms: TITLE_SLOT_MS,
        }
    }
}

/// A run of narration words that fits in one cue.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    pub words: usize,
}

/// Greedy whitespace chunking. A word longer than `max_chars` becomes a chunk of its own.
pub fn chunk_words(text: &str, max_chars: usize) -> Vec<Chunk> {
    let mut out = Vec::new();
    let mut cur = String::new();
    let mut cur_chars = 0usize;
    let mut cur_words = 0usize;

    for word in text.split_whitespace() {
        let n = word.chars().count();
        if cur_words > 0 && cur_chars + 1 + n > max_chars {
            out.push(Chunk {
                text: std::mem::take(&mut cur),
                words: cur_words,
            });
            cur_chars = 0;
            cur_words = 0;
        }
        if cur_words > 0 {
            cur.push(' ');
            cur_chars += 1;
        }
        cur.push_str(word);
        cur_chars += n;
        cur_words += 1;
    }
    if cur_words > 0 {
        out.push(Chunk {
            text: cur,
            words: cur_words,
        });
    }
    out
}

/// Cues for every scene of `script`, laid end to end in script order.
pub fn compile_script(script: &Script, opts: &SubtitleOptions) -> Vec<CaptionCue> {
    let mut cues = Vec::new();
    // Narration of scenes too short to hold a cue; it joins the next cue emitted.
    let mut carried: Vec<String> = Vec::new();
    let mut elapsed_secs = 0.0f64;
    for scene in &script.scenes {
        let start_ms = secs_to_ms(elapsed_secs);
        elapsed_secs += scene.duration_seconds;
        let end_ms = secs_to_ms(elapsed_secs);
        if end_ms <= start_ms {
            tracing::warn!(
                scene = %scene.id,
                "scene shorter than 1ms; narration moved to a neighbouring cue"
            );
            carried.extend(scene.narration().map(single_line));
            continue;
        }

        let mut scene_cues = compile_scene(scene, start_ms, end_ms, opts);
        let target = scene_cues
            .iter()
            .position(|c| c.kind == CueKind::Narration)
            .or((!scene_cues.is_empty()).then_some(0));
        if !carried.is_empty()
            && let Some(i) = target
        {
            carried.push(std::mem::take(&mut scene_cues[i].text));
            scene_cues[i].text = carried.join(" ");
            carried.clear();
        }
        cues.extend(scene_cues);
    }
    if !carried.is_empty() {
        match cues.last_mut() {
            Some(last) => {
                last.text.push(' ');
                last.text.push_str(&carried.join(" "));
            }
            None => tracing::warn!("no cue left to hold narration of sub-millisecond scenes"),
        }
    }
    tracing::debug!(cues = cues.len(), "compiled subtitle track");
    cues
}

/// Cues for one scene occupying `[start_ms, end_ms)`.
pub fn compile_scene(
    scene: &Scene,
    start_ms: u64,
    end_ms: u64,
    opts: &SubtitleOptions,
) -> Vec<CaptionCue> {
    let span = end_ms.saturating_sub(start_ms);
    if span == 0 {
        return Vec::new();
    }

    let chunks = scene
        .narration()
        .map(|text| chunk_words(text, opts.max_chunk_chars))
        .unwrap_or_default();
    let title = single_line(&scene.title);

    if chunks.is_empty() {
        return if opts.include_titles {
            vec![CaptionCue {
                start_ms,
                end_ms,
                text: title,
                kind: CueKind::Title,
            }]
        } else {
            Vec::new()
        };
    }

    let mut cues = Vec::with_capacity(chunks.len() + 1);
    let slot = if opts.include_titles {
        opts.title_slot_ms.min(span / (chunks.len() as u64 + 1))
    } else {
        0
    };
    if slot > 0 {
        cues.push(CaptionCue {
            start_ms,
            end_ms: start_ms + slot,
            text: title,
            kind: CueKind::Title,
        });
    }

    let narration_start = start_ms + slot;
    let narration_span = end_ms - narration_start;
    let total_words: u64 = chunks.iter().map(|c| c.words as u64).sum();

    let mut words_so_far = 0u64;
    let mut cue_start = narration_start;
    let mut pending = String::new();
    for chunk in chunks {
        words_so_far += chunk.words as u64;
        let cue_end = (narration_start + narration_span * words_so_far / total_words).min(end_ms);

        if !pending.is_empty() {
            pending.push(' ');
        }
        pending.push_str(&chunk.text);

        // Zero-length shares ride along with the next chunk.
        if cue_end > cue_start {
            cues.push(CaptionCue {
                start_ms: cue_start,
                end_ms: cue_end,
                text: std::mem::take(&mut pending),
                kind: CueKind::Narration,
            });
            cue_start = cue_end;
        }
    }
    if !pending.is_empty()
        && let Some(last) = cues.last_mut()
    {
        last.text.push(' ');
        last.text.push_str(&pending);
    }
    cues
}

fn secs_to_ms(secs: f64) -> u64 {
    (secs * 1000.0).round().max(0.0) as u64
}

fn single_line(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
#[path = "../../tests/unit/subtitle/cue.rs"]
mod tests;
