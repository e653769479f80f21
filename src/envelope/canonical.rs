//! Canonical body serialization.
//!
//! The service expects repeated payment and VAT rows as flat siblings under
//! `PAYMENTS` and `VATTOTALS`:
//!
//! ```text
//! <PAYMENTS><PMTTYPE>CASH</PMTTYPE><PMTAMOUNT>5000.00</PMTAMOUNT></PAYMENTS>
//! <VATTOTALS><VATRATE>A</VATRATE><NETTAMOUNT>4237.29</NETTAMOUNT><TAXAMOUNT>762.71</TAXAMOUNT></VATTOTALS>
//! ```
//!
//! Documents are first marshaled with the per-row `PAYMENT` / `VATTOTAL`
//! wrappers, then [`flatten_repeated_groups`] removes exactly those two
//! wrappers. Nothing else is touched.

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::core::{
    Document, Payment, Receipt, Registration, VatAggregate, VfdError, ZReport,
};

use super::xml_utils::{Element, XmlWriter, format_amount, format_quantity};

/// Parent / wrapper pairs removed by canonicalization.
pub const REPEATED_GROUPS: [(&str, &str); 2] = [("PAYMENTS", "PAYMENT"), ("VATTOTALS", "VATTOTAL")];

const SIMIMSI: &str = "WEBAPI";
const FW_VERSION: &str = "3.0";
const FW_CHECKSUM: &str = "WEBAPI";
const VAT_CHANGE_NUM: &str = "0";
const HEAD_CHANGE_NUM: &str = "0";

/// Conversion of a document into its marshaled element tree, wrappers included.
pub trait ToXml {
    fn to_xml(&self) -> Element;
}

impl ToXml for Registration {
    fn to_xml(&self) -> Element {
        Element::new("REGDATA")
            .child(Element::leaf("TIN", &self.tin))
            .child(Element::leaf("CERTKEY", &self.cert_key))
    }
}

impl ToXml for Receipt {
    fn to_xml(&self) -> Element {
        let p = &self.params;
        let c = &self.customer;

        let items = Element::new("ITEMS").children(self.items.iter().map(|item| {
            Element::new("ITEM")
                .child(Element::leaf("ID", &item.id))
                .child(Element::leaf("DESC", &item.description))
                .child(Element::leaf("QTY", format_quantity(item.quantity)))
                .child(Element::leaf("TAXCODE", item.tax_code.to_string()))
                .child(Element::leaf("AMT", format_amount(item.amount)))
        }));

        let totals = Element::new("TOTALS")
            .child(Element::leaf(
                "TOTALTAXEXCL",
                format_amount(self.totals.tax_exclusive),
            ))
            .child(Element::leaf(
                "TOTALTAXINCL",
                format_amount(self.totals.tax_inclusive),
            ))
            .child(Element::leaf("DISCOUNT", format_amount(self.totals.discount)));

        let vat_totals = Element::new("VATTOTALS").children(
            self.vat_totals
                .iter()
                .map(|row| vat_row(row, row.category.id().to_string())),
        );

        Element::new("RCT")
            .child(Element::leaf("DATE", p.date.format("%Y-%m-%d").to_string()))
            .child(Element::leaf("TIME", p.time.format("%H:%M:%S").to_string()))
            .child(Element::leaf("TIN", &p.tin))
            .child(Element::leaf("REGID", &p.registration_id))
            .child(Element::leaf("EFDSERIAL", &p.efd_serial))
            .child(Element::leaf("CUSTIDTYPE", c.id_type.code().to_string()))
            .child(Element::leaf("CUSTID", &c.id))
            .child(Element::leaf("CUSTNAME", &c.name))
            .child(Element::leaf("MOBILENUM", &c.mobile))
            .child(Element::leaf("RCTNUM", p.receipt_number.to_string()))
            .child(Element::leaf("DC", p.daily_counter.to_string()))
            .child(Element::leaf("GC", p.global_counter.to_string()))
            .child(Element::leaf("ZNUM", p.z_number()))
            .child(Element::leaf("RCTVNUM", &p.verification_code))
            .child(items)
            .child(totals)
            .child(payments(&self.payments))
            .child(vat_totals)
    }
}

impl ToXml for ZReport {
    fn to_xml(&self) -> Element {
        let p = &self.params;
        let t = &self.totals;

        let header = Element::new("HEADER").children(
            self.header_lines
                .iter()
                .map(|line| Element::leaf("LINE", line)),
        );

        let totals = Element::new("TOTALS")
            .child(Element::leaf(
                "DAILYTOTALAMOUNT",
                format_amount(t.daily_total_amount),
            ))
            .child(Element::leaf("GROSS", format_amount(t.gross)))
            .child(Element::leaf("CORRECTIONS", format_amount(t.corrections)))
            .child(Element::leaf("DISCOUNTS", format_amount(t.discounts)))
            .child(Element::leaf("SURCHARGES", format_amount(t.surcharges)))
            .child(Element::leaf("TICKETSVOID", t.tickets_void.to_string()))
            .child(Element::leaf(
                "TICKETSVOIDTOTAL",
                format_amount(t.tickets_void_total),
            ))
            .child(Element::leaf("TICKETSFISCAL", t.tickets_fiscal.to_string()))
            .child(Element::leaf(
                "TICKETSNONFISCAL",
                t.tickets_non_fiscal.to_string(),
            ));

        let vat_totals = Element::new("VATTOTALS").children(
            self.vat_totals
                .iter()
                .map(|row| vat_row(row, row.category.report_rate())),
        );

        let changes = Element::new("CHANGES")
            .child(Element::leaf("VATCHANGENUM", VAT_CHANGE_NUM))
            .child(Element::leaf("HEADCHANGENUM", HEAD_CHANGE_NUM));

        Element::new("ZREPORT")
            .child(Element::leaf("DATE", p.date.format("%Y-%m-%d").to_string()))
            .child(Element::leaf("TIME", p.time.format("%H:%M:%S").to_string()))
            .child(header)
            .child(Element::leaf("VRN", &p.vrn))
            .child(Element::leaf("TIN", &p.tin))
            .child(Element::leaf("TAXOFFICE", &p.tax_office))
            .child(Element::leaf("REGID", &p.registration_id))
            .child(Element::leaf("ZNUMBER", &p.z_number))
            .child(Element::leaf("EFDSERIAL", &p.efd_serial))
            .child(Element::leaf(
                "REGISTRATIONDATE",
                p.registration_date.format("%Y-%m-%d").to_string(),
            ))
            .child(Element::leaf("USER", ""))
            .child(Element::leaf("SIMIMSI", SIMIMSI))
            .child(totals)
            .child(vat_totals)
            .child(payments(&self.payments))
            .child(changes)
            .child(Element::leaf("ERRORS", ""))
            .child(Element::leaf("FWVERSION", FW_VERSION))
            .child(Element::leaf("FWCHECKSUM", FW_CHECKSUM))
    }
}

impl ToXml for Document {
    fn to_xml(&self) -> Element {
        match self {
            Self::Registration(doc) => doc.to_xml(),
            Self::Receipt(doc) => doc.to_xml(),
            Self::Report(doc) => doc.to_xml(),
        }
    }
}

fn payments(payments: &[Payment]) -> Element {
    Element::new("PAYMENTS").children(payments.iter().map(|p| {
        Element::new("PAYMENT")
            .child(Element::leaf("PMTTYPE", p.payment_type.as_str()))
            .child(Element::leaf("PMTAMOUNT", format_amount(p.amount)))
    }))
}

fn vat_row(row: &VatAggregate, rate: String) -> Element {
    Element::new("VATTOTAL")
        .child(Element::leaf("VATRATE", rate))
        .child(Element::leaf("NETTAMOUNT", format_amount(row.net_amount)))
        .child(Element::leaf("TAXAMOUNT", format_amount(row.tax_amount)))
}

fn wrapper_for(parent: &[u8]) -> Option<&'static str> {
    REPEATED_GROUPS
        .iter()
        .find(|(p, _)| p.as_bytes() == parent)
        .map(|(_, wrapper)| *wrapper)
}

/// Splice the children of every `PAYMENT` under `PAYMENTS` and every
/// `VATTOTAL` under `VATTOTALS` into their parent. Idempotent.
pub fn flatten_repeated_groups(element: &mut Element) {
    for child in &mut element.children {
        flatten_repeated_groups(child);
    }
    if let Some(wrapper) = wrapper_for(element.name.as_bytes()) {
        let children = std::mem::take(&mut element.children);
        element.children = children
            .into_iter()
            .flat_map(|child| {
                if child.name == wrapper {
                    child.children
                } else {
                    vec![child]
                }
            })
            .collect();
    }
}

/// The exact bytes that get signed: marshaled, flattened, compact, no declaration.
pub fn to_canonical_bytes<T: ToXml + ?Sized>(document: &T) -> Result<Vec<u8>, VfdError> {
    let mut tree = document.to_xml();
    flatten_repeated_groups(&mut tree);
    tree.to_bytes()
}

/// Canonicalize an already-marshaled body.
///
/// Events are copied through verbatim except the start and end tags of the
/// repeated-group wrappers, and any XML declaration, which are dropped.
/// Applying this to its own output is a no-op.
///
/// A `PAYMENT` or `VATTOTAL` tag is only dropped when its immediate parent is
/// `PAYMENTS` or `VATTOTALS`. The same name anywhere else keeps its tags, unlike
/// a plain textual replacement of the four tag pairs, which would strip it too.
pub fn canonicalize_bytes(body: &[u8]) -> Result<Vec<u8>, VfdError> {
    let text = std::str::from_utf8(body)
        .map_err(|e| VfdError::Serialization(format!("body is not valid UTF-8: {e}")))?;
    let mut reader = Reader::from_str(text);
    let mut writer = XmlWriter::new();
    // (element name, dropped)
    let mut stack: Vec<(Vec<u8>, bool)> = Vec::new();

    loop {
        let event = reader
            .read_event()
            .map_err(|e| VfdError::Serialization(format!("malformed XML body: {e}")))?;
        match event {
            Event::Eof => break,
            Event::Decl(_) => {}
            Event::Start(ref start) => {
                let name = start.name().as_ref().to_vec();
                let dropped = is_wrapper(&stack, &name);
                stack.push((name, dropped));
                if !dropped {
                    writer.write_event(event)?;
                }
            }
            Event::End(_) => {
                let (_, dropped) = stack.pop().ok_or_else(|| {
                    VfdError::Serialization("unbalanced end tag in body".into())
                })?;
                if !dropped {
                    writer.write_event(event)?;
                }
            }
            Event::Empty(ref empty) => {
                if !is_wrapper(&stack, empty.name().as_ref()) {
                    writer.write_event(event)?;
                }
            }
            other => {
                writer.write_event(other)?;
            }
        }
    }

    if !stack.is_empty() {
        return Err(VfdError::Serialization("unclosed element in body".into()));
    }
    Ok(writer.into_inner())
}

/// Whether `name` is the wrapper expected directly under the open element.
fn is_wrapper(stack: &[(Vec<u8>, bool)], name: &[u8]) -> bool {
    stack
        .last()
        .and_then(|(parent, _)| wrapper_for(parent))
        .is_some_and(|wrapper| wrapper.as_bytes() == name)
}
