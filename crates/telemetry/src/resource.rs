use opentelemetry::KeyValue;
use opentelemetry_sdk::Resource;

/// Builds the immutable identity attached to all emitted telemetry.
///
/// The fixed `service.name` attribute is merged with the caller-supplied
/// tags; on key collision the value supplied last wins.
pub fn build_resource(service_name: &str, attributes: Vec<KeyValue>) -> Resource {
    let mut merged: Vec<KeyValue> = Vec::with_capacity(attributes.len() + 1);
    merged.push(KeyValue::new("service.name", service_name.to_string()));
    for attribute in attributes {
        if let Some(existing) = merged.iter_mut().find(|kv| kv.key == attribute.key) {
            *existing = attribute;
        } else {
            merged.push(attribute);
        }
    }

    Resource::builder().with_attributes(merged).build()
}

/// Converts plain key/value pairs into telemetry attributes.
pub fn build_attributes(attributes: Vec<(String, String)>) -> Vec<KeyValue> {
    attributes.into_iter().map(|(k, v)| KeyValue::new(k, v)).collect()
}
