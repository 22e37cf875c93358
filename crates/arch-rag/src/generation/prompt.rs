//! Prompt template for grounded answers

use crate::types::RetrievedSnippet;

/// Role and answering rules given to the model ahead of the references
pub const SYSTEM_INSTRUCTION: &str = "你是一位專業的雲端架構師，請根據官方文件回答使用者的問題，回答的越詳細越好，
目標是使用者根據你提供的步驟一個一個完成後即可解決使用者提出的問題。

注意:
    1. 盡可能照著官方文件的步驟呈現完整的範例，避免出現無關緊要的回答，但不要出現參考了哪份檔案之類的字眼。
    2. 若在回答之中有些專有名詞或特殊指令，也給出一些解釋。";

/// Prompt builder for grounded queries
pub struct PromptBuilder;

impl PromptBuilder {
    /// Build the grounded prompt
    ///
    /// Both references are always included, whatever their scores.
    pub fn build_rag_prompt(
        primary: &RetrievedSnippet,
        secondary: &RetrievedSnippet,
        question: &str,
    ) -> String {
        format!(
            "{system}\n\n第一個參考資訊：{first}; \n第二個參考資訊：{second};\n\n \n\n使用者的問題: {question}",
            system = SYSTEM_INSTRUCTION,
            first = primary.content,
            second = secondary.content,
            question = question
        )
    }
}
