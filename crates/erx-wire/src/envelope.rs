//! SOAP 1.1 envelope codec.
//!
//! Requests render as an XML declaration followed by `soap:Envelope > soap:Body > <Tag>`, where
//! `<Tag>` carries the operation namespace. Replies are matched structurally: the body must hold
//! exactly one element whose local name starts with the operation tag. A `<Tag>Response`
//! wrapper is unwrapped to its single child.

use crate::constants::{
    OPERATION_NAMESPACE, SOAP_NAMESPACE, XML_HEADER, XSD_NAMESPACE, XSI_NAMESPACE,
};
use crate::operation::Operation;
use crate::xml::Element;
use crate::{WireError, WireReply, WireRequest, WireResult};

/// Render a request as a complete SOAP document.
pub fn encode_request<R: WireRequest>(request: &R) -> String {
    let operation = Element::new(R::OPERATION.tag())
        .with_attribute("xmlns", OPERATION_NAMESPACE)
        .with_children(request.body());

    let envelope = Element::new("soap:Envelope")
        .with_attribute("xmlns:xsi", XSI_NAMESPACE)
        .with_attribute("xmlns:xsd", XSD_NAMESPACE)
        .with_attribute("xmlns:soap", SOAP_NAMESPACE)
        .with_child(Element::new("soap:Body").with_child(operation));

    let mut document = String::from(XML_HEADER);
    document.push_str(&envelope.render());
    document
}

/// Decode a reply document for `operation`.
///
/// Returns the typed reply regardless of its result code; callers gate on
/// [`WireReply::status`].
pub fn decode_reply<R: WireReply>(operation: Operation, document: &str) -> WireResult<R> {
    let element = reply_element(operation, document)?;
    R::from_element(&element)
}

/// Locate the reply element inside a reply document.
pub fn reply_element(operation: Operation, document: &str) -> WireResult<Element> {
    let envelope = Element::parse(document)?;
    if envelope.name != "Envelope" {
        return Err(WireError::Envelope(format!(
            "expected Envelope root, found {}",
            envelope.name
        )));
    }

    let mut body = envelope
        .children
        .into_iter()
        .find(|child| child.name == "Body")
        .ok_or_else(|| WireError::MissingElement("Envelope>Body".into()))?;

    if let Some(fault) = body.child("Fault") {
        return Err(WireError::Fault {
            code: fault.text_of("faultcode").to_owned(),
            message: fault.text_of("faultstring").to_owned(),
        });
    }

    if body.children.len() != 1 {
        return Err(WireError::Envelope(format!(
            "expected one element in Body, found {}",
            body.children.len()
        )));
    }
    let content = body.children.remove(0);
    unwrap_response(operation, content)
}

fn unwrap_response(operation: Operation, mut element: Element) -> WireResult<Element> {
    let tag = operation.tag();

    if element.name == format!("{tag}Response") && element.child("Result").is_none() {
        if element.children.len() != 1 {
            return Err(WireError::Envelope(format!(
                "expected one element in {}, found {}",
                element.name,
                element.children.len()
            )));
        }
        element = element.children.remove(0);
    }

    if !element.name.starts_with(tag) {
        return Err(WireError::Envelope(format!(
            "reply element {} does not answer {tag}",
            element.name
        )));
    }
    Ok(element)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::ResultStatus;

    struct Ping {
        value: &'static str,
    }

    struct Pong {
        status: ResultStatus,
        echo: String,
    }

    impl WireRequest for Ping {
        type Reply = Pong;
        const OPERATION: Operation = Operation::IgnoreAlert;

        fn body(&self) -> Vec<Element> {
            vec![Element::leaf("Value", self.value)]
        }
    }

    impl WireReply for Pong {
        fn from_element(element: &Element) -> WireResult<Self> {
            Ok(Self {
                status: ResultStatus::from_parent(element)?,
                echo: element.text_of("Echo").to_owned(),
            })
        }

        fn status(&self) -> &ResultStatus {
            &self.status
        }
    }

    fn wrap_body(inner: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="utf-8"?><soap:Envelope xmlns:soap="{SOAP_NAMESPACE}"><soap:Body>{inner}</soap:Body></soap:Envelope>"#
        )
    }

    const OK: &str = "<Result><ResultCode>OK</ResultCode><ResultDescription/></Result>";

    #[test]
    fn encoded_request_is_well_formed() {
        let document = encode_request(&Ping { value: "a & b" });
        assert!(document.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));

        let root = Element::parse(&document).unwrap();
        assert_eq!(root.name, "Envelope");
        let body = root.require("Body").unwrap();
        assert_eq!(body.children.len(), 1);

        let operation = &body.children[0];
        assert_eq!(operation.name, "IgnoreAlert");
        assert_eq!(operation.attribute("xmlns"), Some(OPERATION_NAMESPACE));
        assert_eq!(operation.text_of("Value"), "a & b");
    }

    #[test]
    fn decodes_result_element() {
        let document = wrap_body(&format!("<IgnoreAlertResult>{OK}<Echo>hi</Echo></IgnoreAlertResult>"));
        let reply: Pong = decode_reply(Operation::IgnoreAlert, &document).unwrap();
        assert!(reply.status().is_ok());
        assert_eq!(reply.echo, "hi");
    }

    #[test]
    fn unwraps_response_wrapper() {
        let document = wrap_body(&format!(
            "<IgnoreAlertResponse xmlns=\"{OPERATION_NAMESPACE}\"><IgnoreAlertResult>{OK}<Echo>x</Echo></IgnoreAlertResult></IgnoreAlertResponse>"
        ));
        let reply: Pong = decode_reply(Operation::IgnoreAlert, &document).unwrap();
        assert_eq!(reply.echo, "x");
    }

    #[test]
    fn rejects_reply_for_another_operation() {
        let document = wrap_body(&format!("<ApproveRefillResult>{OK}</ApproveRefillResult>"));
        assert!(matches!(
            decode_reply::<Pong>(Operation::IgnoreAlert, &document),
            Err(WireError::Envelope(_))
        ));
    }

    #[test]
    fn rejects_body_with_two_elements() {
        let document = wrap_body("<IgnoreAlertResult/><IgnoreAlertResult/>");
        assert!(matches!(
            decode_reply::<Pong>(Operation::IgnoreAlert, &document),
            Err(WireError::Envelope(_))
        ));
    }

    #[test]
    fn missing_result_is_a_decode_error() {
        let document = wrap_body("<IgnoreAlertResult><Echo>x</Echo></IgnoreAlertResult>");
        assert!(matches!(
            decode_reply::<Pong>(Operation::IgnoreAlert, &document),
            Err(WireError::MissingElement(_))
        ));
    }

    #[test]
    fn surfaces_soap_faults() {
        let document = wrap_body(
            "<soap:Fault><faultcode>soap:Client</faultcode><faultstring>bad sso</faultstring></soap:Fault>",
        );
        match decode_reply::<Pong>(Operation::IgnoreAlert, &document) {
            Err(WireError::Fault { code, message }) => {
                assert_eq!(code, "soap:Client");
                assert_eq!(message, "bad sso");
            }
            other => panic!("expected fault, got {:?}", other.err()),
        }
    }

    #[test]
    fn rejects_non_envelope_documents() {
        assert!(matches!(
            decode_reply::<Pong>(Operation::IgnoreAlert, "<html><body/></html>"),
            Err(WireError::Envelope(_))
        ));
        assert!(matches!(
            decode_reply::<Pong>(Operation::IgnoreAlert, "not xml <"),
            Err(WireError::Xml(_))
        ));
    }
}
