//! SOAP 1.1 envelope writing and response tree extraction.

use chrono::{DateTime, Utc};
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::gateway::client::TransportError;
use crate::gateway::SignedPayload;
use crate::utils::de::TEXT_KEY;

pub const SOAP_NAMESPACE: &str = "http://schemas.xmlsoap.org/soap/envelope/";
pub const GATEWAY_NAMESPACE: &str = "https://checkout.buckaroo.nl/PaymentEngine/";
pub const SOAP_ACTION: &str = "\"TransactionRequest\"";

pub fn build_envelope(payload: &SignedPayload, message_id: Uuid, timestamp: DateTime<Utc>) -> String {
    let mut xml = String::with_capacity(512 + payload.parameters.len() * 64);

    xml.push_str(r#"<?xml version="1.0" encoding="utf-8"?>"#);
    xml.push_str(&format!(
        r#"<soap:Envelope xmlns:soap="{}"><soap:Header>"#,
        SOAP_NAMESPACE
    ));
    xml.push_str(&format!(
        r#"<MessageControlBlock xmlns="{}" Id="{}"><TimeStamp>{}</TimeStamp></MessageControlBlock>"#,
        GATEWAY_NAMESPACE,
        message_id,
        timestamp.timestamp()
    ));
    xml.push_str(&format!(
        r#"<Signature xmlns="{}" Algorithm="{}">{}</Signature>"#,
        GATEWAY_NAMESPACE,
        payload.digest.algorithm_uri(),
        escape(payload.signature.as_str())
    ));
    xml.push_str("</soap:Header><soap:Body>");
    xml.push_str(&format!(r#"<TransactionRequest xmlns="{}">"#, GATEWAY_NAMESPACE));
    for (name, value) in payload.parameters.iter() {
        xml.push_str(&format!(
            r#"<Parameter Name="{}">{}</Parameter>"#,
            escape(name),
            escape(value)
        ));
    }
    xml.push_str("</TransactionRequest></soap:Body></soap:Envelope>");

    xml
}

struct Node {
    name: String,
    fields: Map<String, Value>,
    text: String,
    nil: bool,
}

const SCHEMA_INSTANCE_PREFIX: &[u8] = b"xsi";

impl Node {
    fn open(start: &BytesStart<'_>) -> Result<Self, TransportError> {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
        let mut fields = Map::new();
        let mut nil = false;

        for attribute in start.attributes() {
            let attribute = attribute.map_err(|e| malformed(e.to_string()))?;
            let key = attribute.key;
            if key.as_ref().starts_with(b"xmlns") {
                continue;
            }
            let value = attribute
                .unescape_value()
                .map_err(|e| malformed(e.to_string()))?;

            // xsi:nil, xsi:type and friends describe the element, they are not data.
            if key.prefix().map(|p| p.as_ref() == SCHEMA_INSTANCE_PREFIX).unwrap_or(false) {
                if key.local_name().as_ref() == b"nil" {
                    nil = value.trim() == "true";
                }
                continue;
            }

            let key = String::from_utf8_lossy(key.local_name().as_ref()).into_owned();
            fields.insert(key, Value::String(value.into_owned()));
        }

        Ok(Node {
            name,
            fields,
            text: String::new(),
            nil,
        })
    }

    fn close(self) -> (String, Value) {
        let Node {
            name,
            mut fields,
            text,
            nil,
        } = self;

        if nil {
            return (name, Value::Null);
        }

        let value = match (fields.is_empty(), text.is_empty()) {
            (true, true) => Value::Null,
            (true, false) => Value::String(text),
            (false, true) => Value::Object(fields),
            (false, false) => {
                fields.insert(TEXT_KEY.to_string(), Value::String(text));
                Value::Object(fields)
            }
        };

        (name, value)
    }
}

fn malformed(message: impl Into<String>) -> TransportError {
    TransportError::MalformedResponse(message.into())
}

// Repeated children are folded in place so the parent keeps document order.
fn attach(parent: &mut Map<String, Value>, name: String, value: Value) {
    if let Some(existing) = parent.get_mut(&name) {
        match existing {
            Value::Array(items) => items.push(value),
            other => {
                let first = other.take();
                *other = Value::Array(vec![first, value]);
            }
        }
        return;
    }
    parent.insert(name, value);
}

/// Parses an XML document into the field tree, returning the root element's name and value.
pub fn parse_tree(xml: &str) -> Result<(String, Value), TransportError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut stack: Vec<Node> = Vec::new();
    let mut root: Option<(String, Value)> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| malformed(format!("at byte {}: {}", reader.buffer_position(), e)))?;

        let closed = match event {
            Event::Start(start) => {
                stack.push(Node::open(&start)?);
                None
            }
            Event::Empty(start) => Some(Node::open(&start)?.close()),
            Event::End(_) => {
                let node = stack.pop().ok_or_else(|| malformed("unbalanced end tag"))?;
                Some(node.close())
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(|e| malformed(e.to_string()))?;
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&text);
                }
                None
            }
            Event::CData(data) => {
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
                None
            }
            Event::Eof => break,
            _ => None,
        };

        if let Some((name, value)) = closed {
            match stack.last_mut() {
                Some(parent) => attach(&mut parent.fields, name, value),
                None if root.is_none() => root = Some((name, value)),
                None => return Err(malformed("more than one root element")),
            }
        }
    }

    if !stack.is_empty() {
        return Err(malformed("unexpected end of document"));
    }
    root.ok_or_else(|| malformed("empty document"))
}

fn fault_message(fault: &Value) -> String {
    let field = |name: &str| fault.get(name).and_then(Value::as_str).map(str::to_string);
    field("faultstring")
        .or_else(|| field("faultcode"))
        .unwrap_or_else(|| "unspecified fault".to_string())
}

/// Extracts the transaction response from a SOAP envelope.
pub fn parse_response(xml: &str) -> Result<Value, TransportError> {
    let (root, envelope) = parse_tree(xml)?;
    if root != "Envelope" {
        return Err(malformed(format!("expected a SOAP envelope, found <{}>", root)));
    }

    let body = match envelope.get("Body") {
        Some(Value::Object(body)) => body,
        _ => return Err(malformed("SOAP envelope has no body")),
    };

    if let Some(fault) = body.get("Fault") {
        return Err(TransportError::SoapFault(fault_message(fault)));
    }

    let mut entries = body.iter();
    match (entries.next(), entries.next()) {
        (Some((_, response)), None) => Ok(response.clone()),
        (None, _) => Err(malformed("SOAP body is empty")),
        (Some(_), Some(_)) => Err(malformed("SOAP body holds more than one response")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::signer::{CanonicalParameters, SignatureDigest};
    use serde_json::json;

    const PENDING_RESPONSE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
  <s:Body>
    <TransactionResponse xmlns="https://checkout.buckaroo.nl/PaymentEngine/">
      <Key>4E8BD922192746C3918BF4077CXXXXXX</Key>
      <Status>
        <Code Code="791">Pending processing</Code>
        <SubCode Code="S002">An additional action is required: RedirectToIdeal</SubCode>
        <DateTime>2024-05-11T11:50:52</DateTime>
      </Status>
      <RequiredAction>
        <RedirectURL>https://example/redirect?a=1&amp;b=2</RedirectURL>
        <Type>Redirect</Type>
        <Name>Redirect</Name>
      </RequiredAction>
      <Services>
        <Service Name="ideal" VersionAsProperty="2">
          <ResponseParameter Name="consumerIssuer">Rabobank</ResponseParameter>
        </Service>
      </Services>
      <Invoice>TEST_INVOICE</Invoice>
      <IsTest>true</IsTest>
      <AmountDebit>1.23</AmountDebit>
      <RequestErrors/>
    </TransactionResponse>
  </s:Body>
</s:Envelope>"#;

    #[test]
    fn test_parse_response_builds_field_tree() {
        let tree = parse_response(PENDING_RESPONSE).unwrap();

        assert_eq!(tree["Key"], "4E8BD922192746C3918BF4077CXXXXXX");
        assert_eq!(tree["Status"]["Code"], json!({"Code": "791", "$text": "Pending processing"}));
        assert_eq!(tree["RequiredAction"]["RedirectURL"], "https://example/redirect?a=1&b=2");
        assert_eq!(tree["Services"]["Service"]["Name"], "ideal");
        assert_eq!(
            tree["Services"]["Service"]["ResponseParameter"],
            json!({"Name": "consumerIssuer", "$text": "Rabobank"})
        );
        assert_eq!(tree["RequestErrors"], Value::Null);
    }

    #[test]
    fn test_repeated_elements_become_lists() {
        let (_, tree) = parse_tree("<R><A>1</A><A>2</A><A>3</A></R>").unwrap();
        assert_eq!(tree["A"], json!(["1", "2", "3"]));
    }

    #[test]
    fn test_children_keep_document_order() {
        let (_, tree) = parse_tree("<R><B>1</B><A>2</A><B>3</B><C/></R>").unwrap();
        let keys: Vec<&str> = tree.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["B", "A", "C"]);
        assert_eq!(tree["B"], json!(["1", "3"]));
    }

    #[test]
    fn test_fault_is_reported() {
        let xml = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
            <soap:Body><soap:Fault><faultcode>soap:Client</faultcode>
            <faultstring>Signature invalid</faultstring></soap:Fault></soap:Body></soap:Envelope>"#;

        match parse_response(xml) {
            Err(TransportError::SoapFault(message)) => assert_eq!(message, "Signature invalid"),
            other => panic!("expected a fault, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_documents() {
        assert!(matches!(
            parse_response("<Envelope><Body>"),
            Err(TransportError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_response("<Other/>"),
            Err(TransportError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_response("<Envelope><Body/></Envelope>"),
            Err(TransportError::MalformedResponse(_))
        ));
        assert!(matches!(parse_tree(""), Err(TransportError::MalformedResponse(_))));
    }

    #[test]
    fn test_nil_elements_become_null() {
        let xml = r#"<Response xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
            <Order xsi:nil="true"/>
            <Invoice xsi:type="xsd:string">INV-1</Invoice>
            <Key xsi:nil="false">ABC</Key>
        </Response>"#;

        let (_, tree) = parse_tree(xml).unwrap();
        assert_eq!(tree["Order"], Value::Null);
        assert_eq!(tree["Invoice"], "INV-1");
        assert_eq!(tree["Key"], "ABC");
    }

    #[test]
    fn test_envelope_escapes_and_carries_signature() {
        let payload = SignedPayload {
            parameters: CanonicalParameters::new([("Description", "Fish & <chips>")]),
            signature: "c2lnbmF0dXJl".to_string(),
            digest: SignatureDigest::Sha256,
            test_mode: true,
        };
        let xml = build_envelope(&payload, Uuid::nil(), Utc::now());

        assert!(xml.contains(r#"<Parameter Name="Description">Fish &amp; &lt;chips&gt;</Parameter>"#));
        assert!(xml.contains(">c2lnbmF0dXJl</Signature>"));
        assert!(xml.contains("rsa-sha256"));

        let (root, tree) = parse_tree(&xml).unwrap();
        assert_eq!(root, "Envelope");
        assert_eq!(
            tree["Body"]["TransactionRequest"]["Parameter"]["$text"],
            "Fish & <chips>"
        );
    }
}
