//! Invoice languages and their fixed strings

use crate::core::error::ValidationError;
use crate::invoice::format::sanitize_file_component;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    De,
    En,
    Fr,
    It,
    Es,
    Pl,
    Nl,
}

impl Language {
    pub const ALL: [Language; 7] = [
        Language::De,
        Language::En,
        Language::Fr,
        Language::It,
        Language::Es,
        Language::Pl,
        Language::Nl,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Language::De => "de",
            Language::En => "en",
            Language::Fr => "fr",
            Language::It => "it",
            Language::Es => "es",
            Language::Pl => "pl",
            Language::Nl => "nl",
        }
    }

    pub fn translations(&self) -> &'static Translations {
        match self {
            Language::De => &DE,
            Language::En => &EN,
            Language::Fr => &FR,
            Language::It => &IT,
            Language::Es => &ES,
            Language::Pl => &PL,
            Language::Nl => &NL,
        }
    }

    /// Object key of the stored invoice: `<word>_<order-number>_<lang>.pdf`
    pub fn invoice_file_name(&self, order_number: &str) -> String {
        format!(
            "{}_{}_{}.pdf",
            self.translations().invoice,
            sanitize_file_component(order_number),
            self.code()
        )
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_lowercase();
        // Accept regional tags such as "de-AT".
        let primary = code.split(['-', '_']).next().unwrap_or_default();
        Language::ALL
            .into_iter()
            .find(|l| l.code() == primary)
            .ok_or(ValidationError::UnsupportedLanguage {
                code: s.to_string(),
            })
    }
}

/// Fixed strings printed on the invoice and in the email
#[derive(Debug)]
pub struct Translations {
    pub invoice: &'static str,
    pub invoice_number: &'static str,
    pub invoice_date: &'static str,
    pub order_number: &'static str,
    pub delivery_date: &'static str,
    pub billing_address: &'static str,
    pub delivery_address: &'static str,
    pub product: &'static str,
    pub quantity: &'static str,
    pub unit_price: &'static str,
    pub amount: &'static str,
    pub delivery_fee: &'static str,
    pub net_amount: &'static str,
    pub vat: &'static str,
    pub total: &'static str,
    pub payment_details: &'static str,
    pub recipient: &'static str,
    pub bank: &'static str,
    pub reference: &'static str,
    pub payment_terms: &'static str,
    pub thank_you: &'static str,
    pub vat_id: &'static str,
    pub email_greeting: &'static str,
    pub email_body: &'static str,
    pub email_closing: &'static str,
}

static DE: Translations = Translations {
    invoice: "Rechnung",
    invoice_number: "Rechnungsnummer",
    invoice_date: "Rechnungsdatum",
    order_number: "Bestellnummer",
    delivery_date: "Liefertermin",
    billing_address: "Rechnungsadresse",
    delivery_address: "Lieferadresse",
    product: "Produkt",
    quantity: "Menge (Liter)",
    unit_price: "Preis pro Liter",
    amount: "Betrag",
    delivery_fee: "Lieferkosten",
    net_amount: "Nettobetrag",
    vat: "MwSt.",
    total: "Gesamtbetrag",
    payment_details: "Bankverbindung",
    recipient: "Empfänger",
    bank: "Bank",
    reference: "Verwendungszweck",
    payment_terms: "Bitte überweisen Sie den Betrag innerhalb von {days} Tagen.",
    thank_you: "Vielen Dank für Ihre Bestellung!",
    vat_id: "USt-IdNr.",
    email_greeting: "Guten Tag",
    email_body: "anbei erhalten Sie die Rechnung zu Ihrer Bestellung",
    email_closing: "Mit freundlichen Grüßen",
};

static EN: Translations = Translations {
    invoice: "Invoice",
    invoice_number: "Invoice number",
    invoice_date: "Invoice date",
    order_number: "Order number",
    delivery_date: "Delivery date",
    billing_address: "Billing address",
    delivery_address: "Delivery address",
    product: "Product",
    quantity: "Quantity (liters)",
    unit_price: "Price per liter",
    amount: "Amount",
    delivery_fee: "Delivery fee",
    net_amount: "Net amount",
    vat: "VAT",
    total: "Total",
    payment_details: "Payment details",
    recipient: "Recipient",
    bank: "Bank",
    reference: "Reference",
    payment_terms: "Please transfer the amount within {days} days.",
    thank_you: "Thank you for your order!",
    vat_id: "VAT ID",
    email_greeting: "Hello",
    email_body: "please find attached the invoice for your order",
    email_closing: "Kind regards",
};

static FR: Translations = Translations {
    invoice: "Facture",
    invoice_number: "Numéro de facture",
    invoice_date: "Date de facture",
    order_number: "Numéro de commande",
    delivery_date: "Date de livraison",
    billing_address: "Adresse de facturation",
    delivery_address: "Adresse de livraison",
    product: "Produit",
    quantity: "Quantité (litres)",
    unit_price: "Prix par litre",
    amount: "Montant",
    delivery_fee: "Frais de livraison",
    net_amount: "Montant HT",
    vat: "TVA",
    total: "Total TTC",
    payment_details: "Coordonnées bancaires",
    recipient: "Bénéficiaire",
    bank: "Banque",
    reference: "Référence",
    payment_terms: "Veuillez virer le montant sous {days} jours.",
    thank_you: "Merci pour votre commande !",
    vat_id: "N° TVA",
    email_greeting: "Bonjour",
    email_body: "veuillez trouver ci-joint la facture de votre commande",
    email_closing: "Cordialement",
};

static IT: Translations = Translations {
    invoice: "Fattura",
    invoice_number: "Numero fattura",
    invoice_date: "Data fattura",
    order_number: "Numero ordine",
    delivery_date: "Data di consegna",
    billing_address: "Indirizzo di fatturazione",
    delivery_address: "Indirizzo di consegna",
    product: "Prodotto",
    quantity: "Quantità (litri)",
    unit_price: "Prezzo al litro",
    amount: "Importo",
    delivery_fee: "Spese di consegna",
    net_amount: "Imponibile",
    vat: "IVA",
    total: "Totale",
    payment_details: "Coordinate bancarie",
    recipient: "Beneficiario",
    bank: "Banca",
    reference: "Causale",
    payment_terms: "Si prega di effettuare il bonifico entro {days} giorni.",
    thank_you: "Grazie per il suo ordine!",
    vat_id: "P. IVA",
    email_greeting: "Buongiorno",
    email_body: "in allegato trova la fattura relativa al suo ordine",
    email_closing: "Cordiali saluti",
};

static ES: Translations = Translations {
    invoice: "Factura",
    invoice_number: "Número de factura",
    invoice_date: "Fecha de factura",
    order_number: "Número de pedido",
    delivery_date: "Fecha de entrega",
    billing_address: "Dirección de facturación",
    delivery_address: "Dirección de entrega",
    product: "Producto",
    quantity: "Cantidad (litros)",
    unit_price: "Precio por litro",
    amount: "Importe",
    delivery_fee: "Gastos de envío",
    net_amount: "Base imponible",
    vat: "IVA",
    total: "Total",
    payment_details: "Datos bancarios",
    recipient: "Beneficiario",
    bank: "Banco",
    reference: "Concepto",
    payment_terms: "Por favor, transfiera el importe en un plazo de {days} días.",
    thank_you: "¡Gracias por su pedido!",
    vat_id: "NIF-IVA",
    email_greeting: "Hola",
    email_body: "adjuntamos la factura de su pedido",
    email_closing: "Atentamente",
};

static PL: Translations = Translations {
    invoice: "Faktura",
    invoice_number: "Numer faktury",
    invoice_date: "Data wystawienia",
    order_number: "Numer zamówienia",
    delivery_date: "Termin dostawy",
    billing_address: "Adres rozliczeniowy",
    delivery_address: "Adres dostawy",
    product: "Produkt",
    quantity: "Ilość (litry)",
    unit_price: "Cena za litr",
    amount: "Kwota",
    delivery_fee: "Koszt dostawy",
    net_amount: "Kwota netto",
    vat: "VAT",
    total: "Razem",
    payment_details: "Dane do przelewu",
    recipient: "Odbiorca",
    bank: "Bank",
    reference: "Tytuł przelewu",
    payment_terms: "Prosimy o przelew w ciągu {days} dni.",
    thank_you: "Dziękujemy za zamówienie!",
    vat_id: "NIP",
    email_greeting: "Dzień dobry",
    email_body: "w załączniku przesyłamy fakturę do Państwa zamówienia",
    email_closing: "Z poważaniem",
};

static NL: Translations = Translations {
    invoice: "Factuur",
    invoice_number: "Factuurnummer",
    invoice_date: "Factuurdatum",
    order_number: "Bestelnummer",
    delivery_date: "Leverdatum",
    billing_address: "Factuuradres",
    delivery_address: "Afleveradres",
    product: "Product",
    quantity: "Hoeveelheid (liter)",
    unit_price: "Prijs per liter",
    amount: "Bedrag",
    delivery_fee: "Bezorgkosten",
    net_amount: "Nettobedrag",
    vat: "btw",
    total: "Totaal",
    payment_details: "Bankgegevens",
    recipient: "Begunstigde",
    bank: "Bank",
    reference: "Omschrijving",
    payment_terms: "Gelieve het bedrag binnen {days} dagen over te maken.",
    thank_you: "Bedankt voor uw bestelling!",
    vat_id: "btw-nr.",
    email_greeting: "Goedendag",
    email_body: "in de bijlage vindt u de factuur van uw bestelling",
    email_closing: "Met vriendelijke groet",
};

impl Translations {
    pub fn payment_terms_for(&self, days: u32) -> String {
        self.payment_terms.replace("{days}", &days.to_string())
    }
}
