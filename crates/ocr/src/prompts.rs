use odoscan_core::TaskType;

const NATURAL_TEXT_FOOTER: &str =
    "Your final output must be in JSON format with a single key `natural_text` containing the response.\n";

/// Instructions for prompt-driven OCR backends. The reply is asked for as a
/// `natural_text` JSON document, which the envelope decoder unwraps.
pub fn ocr_prompt(task: TaskType, anchor_text: &str) -> String {
    let body = match task {
        TaskType::Default => concat!(
            "Below is an image of a document page along with its dimensions. ",
            "Simply return the markdown representation of this document, presenting tables in markdown format as they naturally appear.\n",
            "If the document contains images, use a placeholder like dummy.png for each image.\n",
        ),
        TaskType::Structure => concat!(
            "Below is an image of a document page, along with its dimensions and possibly some raw textual content previously extracted from it. ",
            "Note that the text extraction may be incomplete or partially missing. Carefully consider both the layout and any available text to reconstruct the document accurately.\n",
            "Your task is to return the markdown representation of this document, presenting tables in HTML format as they naturally appear.\n",
            "If the document contains images or figures, analyze them and include the tag <figure>IMAGE_ANALYSIS</figure> in the appropriate location.\n",
        ),
        TaskType::MileageOnly => concat!(
            "Below is an image of a document page along with its dimensions. ",
            "Extract and return only the odometer number (ODO) found in the image. Do not include any other text or explanation.\n",
            "If the document contains images, use a placeholder like dummy.png for each image.\n",
        ),
        TaskType::Summary => concat!(
            "Below is an image of a document page along with its dimensions. ",
            "Extract and summarize only the key financial figures from the document such as total revenue, total expenses, net profit/loss, or any clearly indicated summary amounts. ",
            "If the document contains images, use a placeholder like dummy.png for each image.\n",
        ),
    };
    format!("{body}{NATURAL_TEXT_FOOTER}RAW_TEXT_START\n{anchor_text}\nRAW_TEXT_END")
}

/// Default instruction for accounting image analysis: turn a payment
/// journal into import-ready JSON.
pub const PAYMENT_JOURNAL_PROMPT: &str = r#"You are an accountant analysing this Payment Journal document. Extract its data as JSON that can be imported into an accounting system directly, using this structure:

{
  "document_number": "",
  "posting_date": "",
  "printed_date": "",
  "payee": "",
  "payment_method": "",
  "bank": "",
  "total_amount": "",
  "currency": "",
  "transactions": [
    {
      "account_number": "",
      "account_name": "",
      "description": "",
      "debit": "",
      "credit": "",
      "dimension": ""
    }
  ],
  "summary_text": "..."
}

Reply with the JSON only, with no explanation outside it."#;

/// Prompt for summarising text extracted from an uploaded document.
pub fn document_summary_prompt(text: &str) -> String {
    format!("Please summarise or explain this content:\n\n{text}")
}
