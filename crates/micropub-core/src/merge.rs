//! Update merge engine: applies `add`, `replace` and `delete` to an entry.

use tracing::warn;

use crate::codec::Properties;
use crate::domain::{Entry, PropertyName};
use crate::request::DeleteSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// Append to collections, overwrite single values.
    Add,
    /// Clear each touched collection before writing.
    Replace,
}

/// Write every non-empty property of `props` into `entry`.
pub fn apply(entry: &mut Entry, props: &Properties, mode: MergeMode) {
    set_first(&mut entry.updated_at, props.updated.first().map(|v| Some(v.0)));
    set_first(&mut entry.published_at, props.published.first().map(|v| Some(v.0)));
    set_first(&mut entry.title, props.name.first().cloned());
    set_first(&mut entry.description, props.summary.first().cloned());
    set_first(
        &mut entry.content,
        props.content.first().map(|c| c.text().as_bytes().to_vec()),
    );
    set_first(&mut entry.url, props.url.first().map(|v| Some(v.0.clone())));
    set_first(&mut entry.uid, props.uid.first().cloned());
    set_first(&mut entry.rsvp, props.rsvp.first().copied());
    set_first(&mut entry.visibility, props.visibility.first().copied());
    set_first(&mut entry.post_status, props.post_status.first().copied());
    set_first(&mut entry.latitude, props.latitude.first().map(|c| Some(c.0)));
    set_first(&mut entry.longitude, props.longitude.first().map(|c| Some(c.0)));
    set_first(&mut entry.altitude, props.altitude.first().map(|c| Some(c.0)));

    merge_list(&mut entry.tags, props.category.clone(), mode);
    merge_list(
        &mut entry.photos,
        props.photo.iter().map(|f| f.value.clone()).collect(),
        mode,
    );
    merge_list(
        &mut entry.videos,
        props.video.iter().map(|f| f.value.clone()).collect(),
        mode,
    );
    merge_list(
        &mut entry.audio,
        props.audio.iter().map(|f| f.value.clone()).collect(),
        mode,
    );
    merge_list(
        &mut entry.syndications,
        props.syndication.iter().map(|u| u.0.clone()).collect(),
        mode,
    );
    merge_list(
        &mut entry.in_reply_to,
        props.in_reply_to.iter().map(|u| u.0.clone()).collect(),
        mode,
    );

    for (key, value) in &props.extensions {
        if value.is_empty() {
            continue;
        }

        match (mode, entry.extensions.get_mut(key)) {
            (MergeMode::Add, Some(current)) => current.append(value.clone()),
            _ => {
                entry.extensions.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Apply an update in its fixed order: add, then replace, then delete.
pub fn merge(
    entry: &mut Entry,
    add: Option<&Properties>,
    replace: Option<&Properties>,
    delete: Option<&DeleteSpec>,
) {
    if let Some(add) = add {
        apply(entry, add, MergeMode::Add);
    }

    if let Some(replace) = replace {
        apply(entry, replace, MergeMode::Replace);
    }

    match delete {
        Some(DeleteSpec::Keys(keys)) => {
            for key in keys {
                entry.clear_property(&PropertyName::parse(key));
            }
        }
        Some(DeleteSpec::Values(values)) => {
            // TODO: remove single values once figure and content matching rules are settled.
            warn!(
                properties = ?serde_json::to_value(values).ok(),
                "Value-level deletion is not supported, ignoring"
            );
        }
        None => {}
    }
}

fn set_first<T>(target: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *target = value;
    }
}

fn merge_list<T>(target: &mut Vec<T>, values: Vec<T>, mode: MergeMode) {
    if values.is_empty() {
        return;
    }

    if mode == MergeMode::Replace {
        target.clear();
    }

    target.extend(values);
}
