use crate::model::{Atlas, AtlasSprite, Page};
use serde_json::{Value, json};

fn sprite_value(s: &AtlasSprite) -> Value {
    let mut v = json!({
        "frame": {"x": s.frame.x, "y": s.frame.y, "w": s.frame.w, "h": s.frame.h},
        "spriteSourceSize": {"x": s.source.x, "y": s.source.y, "w": s.source.w, "h": s.source.h},
        "pivot": {"x": s.pivot.x, "y": s.pivot.y},
        "page": s.page,
    });
    if let (Some(alias), Some(obj)) = (&s.alias_of, v.as_object_mut()) {
        obj.insert("aliasOf".into(), json!(alias));
    }
    v
}

fn page_size(page: &Page) -> Value {
    json!({"w": page.width, "h": page.height})
}

/// Serialize the atlas as `{ pages: [{ id, width, height, sprites: [...] }], aliases, meta }`.
pub fn to_json_array(atlas: &Atlas) -> Value {
    let pages: Vec<Value> = atlas
        .pages
        .iter()
        .map(|p| {
            let sprites: Vec<Value> = p
                .sprites
                .iter()
                .map(|s| {
                    let mut v = sprite_value(s);
                    if let Some(obj) = v.as_object_mut() {
                        obj.insert("name".into(), json!(s.name));
                    }
                    v
                })
                .collect();
            json!({
                "id": p.id,
                "width": p.width,
                "height": p.height,
                "sprites": sprites,
            })
        })
        .collect();
    json!({"pages": pages, "aliases": &atlas.aliases, "meta": &atlas.meta})
}

/// Flatten sprites keyed by name, aliases included, with page id and size hints.
/// Shape: `{ frames: { name: { frame, spriteSourceSize, pivot, page, pageSize, aliasOf? } }, meta }`.
pub fn to_json_hash(atlas: &Atlas) -> Value {
    let mut frames = serde_json::Map::new();
    for page in &atlas.pages {
        for s in &page.sprites {
            let mut v = sprite_value(s);
            if let Some(obj) = v.as_object_mut() {
                obj.insert("pageSize".into(), page_size(page));
            }
            frames.insert(s.name.clone(), v);
        }
    }
    json!({ "frames": frames, "meta": &atlas.meta })
}
